use crate::Severity;
use std::fmt::{self, Write};

/// A log record as it is handed to each sink.
///
/// The timestamp is not part of the record, it is provided alongside by a
/// [`DeferredNow`](crate::DeferredNow), so that all sinks see the same instant.
#[derive(Clone, Copy, Debug)]
pub struct LogRecord<'a> {
    severity: Severity,
    logger_name: &'a str,
    message: &'a str,
    file: &'a str,
    line: u32,
}

impl<'a> LogRecord<'a> {
    /// Creates a record.
    #[must_use]
    pub fn new(
        severity: Severity,
        logger_name: &'a str,
        message: &'a str,
        file: &'a str,
        line: u32,
    ) -> Self {
        Self {
            severity,
            logger_name,
            message,
            file,
            line,
        }
    }

    /// Severity of the record.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }
    /// Name of the logger that produced the record.
    #[must_use]
    pub fn logger_name(&self) -> &'a str {
        self.logger_name
    }
    /// The fully composed message.
    #[must_use]
    pub fn message(&self) -> &'a str {
        self.message
    }
    /// Source file of the logging call.
    #[must_use]
    pub fn file(&self) -> &'a str {
        self.file
    }
    /// Source line of the logging call.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// A context value that is appended to a log message.
///
/// Strings render quoted, booleans as `True` and `False`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Rendered in single quotes, or in double quotes if it contains only single quotes.
    Str(String),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A float, always rendered with a decimal point, or as `nan`, `inf`, `-inf`.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// Anything else, already rendered (usually via `Debug`).
    Other(String),
}

impl Value {
    /// Captures an arbitrary value through its `Debug` implementation.
    pub fn debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Self::Other(format!("{value:?}"))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write_quoted(f, s),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) if x.is_nan() => f.write_str("nan"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

fn write_quoted(f: &mut dyn Write, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Self::Float(f64::from(x))
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Self::Int(i64::from(i))
            }
        }
    )*};
}
macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(u: $t) -> Self {
                Self::UInt(u64::from(u))
            }
        }
    )*};
}
from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Self::UInt(u as u64)
    }
}
impl From<isize> for Value {
    fn from(i: isize) -> Self {
        Self::Int(i as i64)
    }
}

/// Additional information for a single logging call: an optional tag,
/// positional and keyword values, and optionally an error.
///
/// ```rust
/// use nice_tools::Context;
///
/// let ctx = Context::tagged("sync").arg(3).kwarg("user", "bob");
/// assert_eq!(ctx.compose("done", "info"), "[sync] - done | (3,) | {'user': 'bob'}");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context {
    tag: Option<String>,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
    error: Option<String>,
}

impl Context {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with the given tag.
    #[must_use]
    pub fn tagged<S: Into<String>>(tag: S) -> Self {
        Self::new().tag(tag)
    }

    /// Sets the tag that replaces the default tag (the name of the logging method).
    #[must_use]
    pub fn tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Appends a positional value.
    #[must_use]
    pub fn arg<V: Into<Value>>(mut self, value: V) -> Self {
        self.args.push(value.into());
        self
    }

    /// Appends a keyword value; keys keep their insertion order.
    #[must_use]
    pub fn kwarg<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.kwargs.push((key.into(), value.into()));
        self
    }

    /// Attaches an error; its chain of sources is appended to the message.
    #[must_use]
    pub fn error(mut self, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut s = format!("Error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            s.push_str(&format!("\nCaused by: {cause}"));
            source = cause.source();
        }
        self.error = Some(s);
        self
    }

    /// Composes the final message, using `default_tag` if no tag was set.
    #[must_use]
    pub fn compose(&self, message: &str, default_tag: &str) -> String {
        let mut s = compose_message(
            message,
            self.tag.as_deref().unwrap_or(default_tag),
            &self.args,
            &self.kwargs,
        );
        if let Some(ref error) = self.error {
            s.push('\n');
            s.push_str(error);
        }
        s
    }
}

/// Builds `"[tag] - message"`, followed by `" | (a, b)"` if positional values are given,
/// and by `" | {'k': v}"` if keyword values are given.
#[must_use]
pub fn compose_message(
    message: &str,
    tag: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> String {
    let mut s = format!("[{tag}] - {message}");
    if !args.is_empty() {
        s.push_str(" | (");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            write!(s, "{arg}").ok();
        }
        if args.len() == 1 {
            s.push(',');
        }
        s.push(')');
    }
    if !kwargs.is_empty() {
        s.push_str(" | {");
        for (i, (key, value)) in kwargs.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            write_quoted(&mut s, key).ok();
            write!(s, ": {value}").ok();
        }
        s.push('}');
    }
    s
}

use crate::{DeferredNow, LogRecord, NiceToolsError, Severity};
use std::{fmt::Write, str::FromStr};

#[cfg(feature = "colors")]
use nu_ansi_term::{Color, Style};

/// Layout of console and file lines, if nothing else is configured.
///
/// Produces lines like
/// ```text
/// 2024-03-01 17:04:13,095 - (42):[INFO] --> [info] - Task successfully read from conf.json
/// ```
/// (the formatter adds the logger name in front).
pub const DEFAULT_TEMPLATE: &str = "{asctime} - ({lineno}):[{levelname}] --> {message}";

/// Layout of notifications, if nothing else is configured.
pub const DEFAULT_NOTIFICATION_TEMPLATE: &str =
    "[{levelname}]\n{lineno} - {filename}:\n\n{message}";

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Literal(String),
    AscTime,
    LineNo,
    LevelName,
    Message,
    Name,
    FileName,
    Thread,
}

/// A parsed log line template.
///
/// Placeholders are written in braces; `{{` and `}}` produce literal braces.
///
/// | placeholder   | is replaced with                                   |
/// |---------------|----------------------------------------------------|
/// | `{asctime}`   | local time, like `2024-03-01 17:04:13,095`         |
/// | `{lineno}`    | source line of the logging call                    |
/// | `{levelname}` | `DEBUG`, `INFO`, `WARNING`, `ERROR` or `CRITICAL`  |
/// | `{message}`   | the composed message                               |
/// | `{name}`      | the logger name                                    |
/// | `{filename}`  | source file of the logging call                    |
/// | `{thread}`    | name of the logging thread, or `<unnamed>`         |
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Template` if the template contains an unknown placeholder
    /// or an unbalanced brace.
    pub fn parse(s: &str) -> Result<Self, NiceToolsError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => placeholder.push(c),
                            None => {
                                return Err(NiceToolsError::Template(format!(
                                    "unclosed placeholder '{{{placeholder}' in \"{s}\""
                                )));
                            }
                        }
                    }
                    let segment = match placeholder.as_str() {
                        "asctime" => Segment::AscTime,
                        "lineno" => Segment::LineNo,
                        "levelname" => Segment::LevelName,
                        "message" => Segment::Message,
                        "name" => Segment::Name,
                        "filename" => Segment::FileName,
                        "thread" => Segment::Thread,
                        _ => {
                            return Err(NiceToolsError::Template(format!(
                                "unknown placeholder '{{{placeholder}}}' in \"{s}\""
                            )));
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => {
                    return Err(NiceToolsError::Template(format!(
                        "unmatched '}}' in \"{s}\""
                    )));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    // Returns a copy that is surrounded with the given literal texts.
    fn wrapped(&self, before: &str, after: &str) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 2);
        if !before.is_empty() {
            segments.push(Segment::Literal(before.to_string()));
        }
        segments.extend(self.segments.iter().cloned());
        if !after.is_empty() {
            segments.push(Segment::Literal(after.to_string()));
        }
        Self { segments }
    }

    /// Renders the record into the given buffer.
    pub fn render(&self, buf: &mut String, now: &mut DeferredNow, record: &LogRecord) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => buf.push_str(s),
                Segment::AscTime => buf.push_str(&now.format_asctime()),
                Segment::LineNo => {
                    write!(buf, "{}", record.line()).ok();
                }
                Segment::LevelName => buf.push_str(record.severity().name()),
                Segment::Message => buf.push_str(record.message()),
                Segment::Name => buf.push_str(record.logger_name()),
                Segment::FileName => buf.push_str(record.file()),
                Segment::Thread => {
                    buf.push_str(std::thread::current().name().unwrap_or("<unnamed>"));
                }
            }
        }
    }
}

impl FromStr for Template {
    type Err = NiceToolsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE).unwrap(/* the default template is valid */)
    }
}

/// Renders log records into lines, with one template per severity.
///
/// Every template starts with `[<name>] - `. With colorization, each template is wrapped into
/// a severity specific ANSI color and a reset code; the file sink always uses the uncolored
/// variant.
#[derive(Clone, Debug)]
pub struct MessageFormatter {
    formats: [Template; 5],
}

impl MessageFormatter {
    /// Creates the formatter for the logger `name`.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Template` if `template` cannot be parsed.
    pub fn new(name: &str, template: &str, colored: bool) -> Result<Self, NiceToolsError> {
        Ok(Self::with_template(name, &Template::parse(template)?, colored))
    }

    /// Creates the formatter for the logger `name` from an already parsed template.
    #[must_use]
    pub fn with_template(name: &str, template: &Template, colored: bool) -> Self {
        let prefix = format!("[{name}] - ");
        let plain = template.wrapped(&prefix, "");
        let formats = Severity::ALL.map(|severity| {
            if colored {
                let (start, reset) = color_codes(severity);
                plain.wrapped(&start, &reset)
            } else {
                plain.clone()
            }
        });
        Self { formats }
    }

    /// Renders a record through the template of its severity.
    #[must_use]
    pub fn format(&self, now: &mut DeferredNow, record: &LogRecord) -> String {
        let mut buf = String::with_capacity(200);
        self.formats[record.severity().index()].render(&mut buf, now, record);
        buf
    }
}

#[cfg(feature = "colors")]
fn style(severity: Severity) -> Style {
    match severity {
        Severity::Debug => Color::LightBlue.normal(),
        Severity::Info => Color::DarkGray.normal(),
        Severity::Warning => Color::LightYellow.normal(),
        Severity::Error => Color::LightRed.normal(),
        Severity::Critical => Color::Red.bold(),
    }
}

#[cfg(feature = "colors")]
fn color_codes(severity: Severity) -> (String, String) {
    let style = style(severity);
    (style.prefix().to_string(), style.suffix().to_string())
}

#[cfg(not(feature = "colors"))]
fn color_codes(_severity: Severity) -> (String, String) {
    (String::new(), String::new())
}

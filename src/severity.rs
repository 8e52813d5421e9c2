use std::fmt;

/// The severity of a log record.
///
/// Ordered from least to most severe, so that `Severity::Warning > Severity::Info`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde_derive::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Detailed information, typically of interest only when diagnosing problems.
    Debug,
    /// Confirmation that things are working as expected.
    Info,
    /// Something unexpected happened, but the program continues to work.
    Warning,
    /// A function could not be performed.
    Error,
    /// The program itself may be unable to continue.
    Critical,
}

impl Severity {
    /// All severities, from `Debug` to `Critical`.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Name as it appears in the `{levelname}` placeholder.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// The `log` facade has no critical level; records coming through it are never critical.
impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Self::Debug,
            log::Level::Info => Self::Info,
            log::Level::Warn => Self::Warning,
            log::Level::Error => Self::Error,
        }
    }
}

impl From<Severity> for log::LevelFilter {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Debug => log::LevelFilter::Trace,
            Severity::Info => log::LevelFilter::Info,
            Severity::Warning => log::LevelFilter::Warn,
            Severity::Error | Severity::Critical => log::LevelFilter::Error,
        }
    }
}

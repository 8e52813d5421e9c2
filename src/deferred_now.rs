use chrono::{DateTime, Local};

/// Deferred timestamp creation.
///
/// Is used to ensure that a log record that is sent to multiple sinks
/// (in maybe different formats) always uses the same timestamp.
#[derive(Debug, Default)]
pub struct DeferredNow(Option<DateTime<Local>>);

impl<'a> DeferredNow {
    /// Constructs a new instance, but does not generate the timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(None)
    }

    #[cfg(test)]
    pub(crate) fn new_from_datetime(dt: DateTime<Local>) -> Self {
        Self(Some(dt))
    }

    /// Retrieve the timestamp.
    ///
    /// Requires mutability because the first caller will generate the timestamp.
    pub fn now(&'a mut self) -> &'a DateTime<Local> {
        self.0.get_or_insert_with(Local::now)
    }

    /// Renders the timestamp in the layout used by the `{asctime}` placeholder,
    /// e.g. `2024-03-01 17:04:13,095`.
    pub fn format_asctime(&mut self) -> String {
        self.now().format("%Y-%m-%d %H:%M:%S,%3f").to_string()
    }
}

#[cfg(test)]
mod test {
    use chrono::{Local, TimeZone};

    #[test]
    fn test_deferred_now() {
        let mut deferred_now = super::DeferredNow::new();
        let now = deferred_now.now().to_string();
        std::thread::sleep(std::time::Duration::from_millis(30));
        let again = deferred_now.now().to_string();
        assert_eq!(now, again);
    }

    #[test]
    fn test_asctime() {
        let ts = Local
            .with_ymd_and_hms(2024, 3, 1, 17, 4, 13)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(95))
            .unwrap();
        let mut deferred_now = super::DeferredNow::new_from_datetime(ts);
        assert_eq!(deferred_now.format_asctime(), "2024-03-01 17:04:13,095");
    }
}

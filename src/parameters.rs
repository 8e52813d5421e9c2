mod when;

pub use self::when::{Schedule, When};

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// -----------------------------------------------------------------------------
// Verbosity
// -----------------------------------------------------------------------------

/// The output verbosity level, passed to the logger through `RUST_LOG`.
///
/// ```rust
/// use hicflow::Verbosity;
///
/// assert_eq!(Verbosity::default().to_string(), "info");
/// assert_eq!(Verbosity::Debug.level(), log::LevelFilter::Debug);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Verbosity {
    #[default]
    Info,
    Warn,
    Debug,
    Error,
    Trace,
}

impl Verbosity {
    pub fn level(&self) -> LevelFilter {
        match self {
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Warn => LevelFilter::Warn,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Error => LevelFilter::Error,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        // RUST_LOG expects lowercase level names
        write!(f, "{}", self.level().as_str().to_lowercase())
    }
}

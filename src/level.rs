//! The fixed set of log reporting levels.
//!
//! Levels follow the usual syslog-style ladder. Catch specifications, the
//! fallback specification and the host [`Config`](crate::Config) each may pin
//! a level; the first one set wins when a failure is resolved.

use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::{Error, Result};

/// A log reporting level.
///
/// The set is closed: anything outside these eight values is rejected with
/// [`Error::LevelNotAllowed`] when parsed from configuration strings.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// Detailed debug information.
    Debug,
    /// Interesting events.
    Info,
    /// Normal but significant events.
    Notice,
    /// Exceptional occurrences that are not errors.
    Warning,
    /// Runtime errors that do not require immediate action.
    Error,
    /// Critical conditions.
    Critical,
    /// Action must be taken immediately.
    Alert,
    /// The system is unusable.
    Emergency,
}

impl Level {
    /// Parses a level from its lowercase string form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LevelNotAllowed`] when the string is not one of the
    /// eight allowed levels.
    pub fn parse(level: &str) -> Result<Self> {
        Self::from_str(level).map_err(|_| Error::LevelNotAllowed {
            level: level.to_string(),
            allowed: Self::allowed_list(),
        })
    }

    /// The comma-separated list of allowed level names.
    #[must_use]
    pub fn allowed_list() -> String {
        Self::iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Error
    }
}

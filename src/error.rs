use thiserror::Error;

/// The generic Error type, which provides coverage for all configuration and
/// reconstruction errors this library can potentially return.
///
/// All variants are initialisation-class failures: they indicate that the
/// caller (or the host configuration) supplied something invalid, and they are
/// always surfaced synchronously to the configuring code. Failures that occur
/// inside a wrapped unit of work travel as [`Fault`](crate::Fault) values
/// instead and never use this type.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::LevelNotAllowed`] - A reporting level string outside the fixed set
/// - [`Error::InvalidRegex`] - A message-match pattern that does not compile
/// - [`Error::NoneProvided`] - A list-taking builder method called with nothing
///
/// ## Reconstruction Errors
/// - [`Error::InvalidMetaType`] - Stored call-stack metadata with an unknown tag
/// - [`Error::OutOfRange`] - A call-stack position that does not exist
#[derive(Error, Debug)]
pub enum Error {
    /// The requested log reporting level is not one of the allowed levels.
    ///
    /// Raised when parsing a level string from host configuration. The valid
    /// set is the eight levels of [`Level`](crate::Level).
    #[error("Level \"{level}\" is not allowed. Please choose from: {allowed}")]
    LevelNotAllowed {
        /// The level string that was rejected.
        level: String,
        /// The comma-separated list of allowed levels.
        allowed: String,
    },

    /// Stored call-stack metadata carries a tag that cannot be resolved back
    /// into a typed meta record.
    ///
    /// This occurs while fusing tracked metadata into a diagnostic context,
    /// when a record's kind tag (or its payload shape) is unrecognised.
    #[error("Invalid meta type \"{kind}\"")]
    InvalidMetaType {
        /// The unrecognised kind tag.
        kind: String,
    },

    /// A call-stack position was requested that does not exist.
    ///
    /// Returned by [`CallStack::seek`](crate::callstack::CallStack::seek) and
    /// [`CallStack::set`](crate::callstack::CallStack::set) when the index is
    /// not a valid frame position.
    #[error("Position {index} does not exist (0..{len})")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The number of frames in the stack.
        len: usize,
    },

    /// A message-match regex failed to compile.
    #[error("Invalid match regex \"{pattern}\"")]
    InvalidRegex {
        /// The pattern that was rejected.
        pattern: String,
        /// The underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// A builder method that requires at least one value was given none.
    #[error("Please provide at least one value when calling {method}()")]
    NoneProvided {
        /// The builder method that was called.
        method: &'static str,
    },
}

/// The result type used throughout `faultline` for configuration and
/// reconstruction operations.
pub type Result<T> = std::result::Result<T, Error>;

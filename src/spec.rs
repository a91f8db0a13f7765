//! Catch specifications: the match criteria and resolution settings attached
//! to a wrapped execution.

use std::error::Error as StdError;
use std::rc::Rc;

use regex::Regex;

use crate::catcher::Callback;
use crate::fault::Fault;
use crate::{Error, FailureEvent, Level, Result, Verdict};

/// One error-type criterion: a display name plus the closure that tests a
/// fault against the type (walking its source chain).
#[derive(Clone)]
pub struct TypeMatcher {
    pub(crate) name: &'static str,
    pub(crate) check: Rc<dyn Fn(&Fault) -> bool>,
}

impl TypeMatcher {
    /// A matcher for one concrete error type.
    #[must_use]
    pub fn of<E: StdError + 'static>() -> Self {
        Self {
            name: std::any::type_name::<E>(),
            check: Rc::new(|fault| fault.is::<E>()),
        }
    }

    /// A matcher that accepts every fault.
    #[must_use]
    pub fn any() -> Self {
        Self {
            name: "any",
            check: Rc::new(|_| true),
        }
    }

    /// The matcher's display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for TypeMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMatcher").field("name", &self.name).finish()
    }
}

/// A configured fallback value, distinguishing "not configured" from any
/// configured value.
#[derive(Clone, Default)]
pub enum DefaultValue<T> {
    /// No default was configured.
    #[default]
    Unset,
    /// A ready value, cloned on resolution.
    Value(T),
    /// A thunk invoked on resolution.
    Thunk(Rc<dyn Fn() -> T>),
}

impl<T: Clone> DefaultValue<T> {
    /// Whether a default was configured at all.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(self, DefaultValue::Unset)
    }

    /// Produces the configured value, if any.
    #[must_use]
    pub fn resolve(&self) -> Option<T> {
        match self {
            DefaultValue::Unset => None,
            DefaultValue::Value(value) => Some(value.clone()),
            DefaultValue::Thunk(thunk) => Some(thunk()),
        }
    }
}

impl<T> std::fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Unset => f.write_str("Unset"),
            DefaultValue::Value(_) => f.write_str("Value(..)"),
            DefaultValue::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

/// One catch specification: which faults it claims, and how a claimed fault
/// is handled.
///
/// A specification with no type criteria claims every fault. Every field left
/// unset inherits from the catcher's fallback specification when the fault is
/// resolved; see [`Inspector`](crate::inspector::Inspector) for the exact
/// inheritance chain per field.
///
/// `T` is the wrapped execution's success type, needed for the typed default
/// value.
#[derive(Clone)]
pub struct CatchSpec<T> {
    pub(crate) types: Vec<TypeMatcher>,
    pub(crate) match_strings: Vec<String>,
    pub(crate) match_regexes: Vec<Regex>,
    pub(crate) callbacks: Vec<Callback>,
    pub(crate) known: Vec<String>,
    pub(crate) channels: Vec<String>,
    pub(crate) level: Option<Level>,
    pub(crate) report: Option<bool>,
    pub(crate) rethrow: Option<bool>,
    pub(crate) default: DefaultValue<T>,
}

impl<T> Default for CatchSpec<T> {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            match_strings: Vec::new(),
            match_regexes: Vec::new(),
            callbacks: Vec::new(),
            known: Vec::new(),
            channels: Vec::new(),
            level: None,
            report: None,
            rethrow: None,
            default: DefaultValue::Unset,
        }
    }
}

impl<T> CatchSpec<T> {
    /// Creates an empty specification (claims every fault, inherits every
    /// setting).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a specification claiming one error type.
    #[must_use]
    pub fn for_type<E: StdError + 'static>() -> Self {
        Self::new().catch_type::<E>()
    }

    /// Adds an error type to claim. A fault is claimed when the wrapped
    /// error, or anything in its source chain, is of the given type.
    #[must_use]
    pub fn catch_type<E: StdError + 'static>(mut self) -> Self {
        self.types.push(TypeMatcher::of::<E>());
        self
    }

    /// Explicitly claims every fault.
    ///
    /// Unlike leaving the type list empty, this counts as declaring a type:
    /// on a fallback specification it turns the fallback into a catch-all
    /// rule even when explicit specifications exist.
    #[must_use]
    pub fn catch_all(mut self) -> Self {
        self.types.push(TypeMatcher::any());
        self
    }

    /// Requires the fault message to equal the given string.
    #[must_use]
    pub fn match_message(mut self, message: impl Into<String>) -> Self {
        self.match_strings.push(message.into());
        self
    }

    /// Requires the fault message to equal one of the given strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`] when the list is empty.
    pub fn match_messages(mut self, messages: Vec<String>) -> Result<Self> {
        if messages.is_empty() {
            return Err(Error::NoneProvided {
                method: "match_messages",
            });
        }
        self.match_strings.extend(messages);
        Ok(self)
    }

    /// Requires the fault message to contain a match of the given pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegex`] when the pattern does not compile.
    pub fn match_regex(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        self.match_regexes.push(regex);
        Ok(self)
    }

    /// Requires the fault message to contain a match of one of the patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`] when the list is empty, or
    /// [`Error::InvalidRegex`] when a pattern does not compile.
    pub fn match_regexes(mut self, patterns: Vec<&str>) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Error::NoneProvided {
                method: "match_regexes",
            });
        }
        for pattern in patterns {
            self = self.match_regex(pattern)?;
        }
        Ok(self)
    }

    /// Attaches a callback, run when this specification resolves a fault.
    #[must_use]
    pub fn callback(mut self, callback: impl Fn(&FailureEvent) -> Verdict + 'static) -> Self {
        self.callbacks.push(Rc::new(callback));
        self
    }

    /// Tags resolved faults with a known-issue label.
    #[must_use]
    pub fn known(mut self, tag: impl Into<String>) -> Self {
        self.known.push(tag.into());
        self
    }

    /// Tags resolved faults with several known-issue labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`] when the list is empty.
    pub fn known_tags(mut self, tags: Vec<String>) -> Result<Self> {
        if tags.is_empty() {
            return Err(Error::NoneProvided {
                method: "known_tags",
            });
        }
        self.known.extend(tags);
        Ok(self)
    }

    /// Reports resolved faults on the given channel.
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.push(channel.into());
        self
    }

    /// Reports resolved faults on the given channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`] when the list is empty.
    pub fn channels(mut self, channels: Vec<String>) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::NoneProvided {
                method: "channels",
            });
        }
        self.channels.extend(channels);
        Ok(self)
    }

    /// Sets the reporting level for resolved faults.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Reports at debug level.
    #[must_use]
    pub fn debug(self) -> Self {
        self.level(Level::Debug)
    }

    /// Reports at info level.
    #[must_use]
    pub fn info(self) -> Self {
        self.level(Level::Info)
    }

    /// Reports at notice level.
    #[must_use]
    pub fn notice(self) -> Self {
        self.level(Level::Notice)
    }

    /// Reports at warning level.
    #[must_use]
    pub fn warning(self) -> Self {
        self.level(Level::Warning)
    }

    /// Reports at error level.
    #[must_use]
    pub fn error(self) -> Self {
        self.level(Level::Error)
    }

    /// Reports at critical level.
    #[must_use]
    pub fn critical(self) -> Self {
        self.level(Level::Critical)
    }

    /// Reports at alert level.
    #[must_use]
    pub fn alert(self) -> Self {
        self.level(Level::Alert)
    }

    /// Reports at emergency level.
    #[must_use]
    pub fn emergency(self) -> Self {
        self.level(Level::Emergency)
    }

    /// Decides whether resolved faults are reported.
    #[must_use]
    pub fn report(mut self, report: bool) -> Self {
        self.report = Some(report);
        self
    }

    /// Shorthand for `report(false)`.
    #[must_use]
    pub fn dont_report(self) -> Self {
        self.report(false)
    }

    /// Decides whether resolved faults are rethrown.
    #[must_use]
    pub fn rethrow(mut self, rethrow: bool) -> Self {
        self.rethrow = Some(rethrow);
        self
    }

    /// Shorthand for `rethrow(false)`.
    #[must_use]
    pub fn dont_rethrow(self) -> Self {
        self.rethrow(false)
    }

    /// Returns the given value when this specification swallows a fault.
    #[must_use]
    pub fn default_value(mut self, value: T) -> Self {
        self.default = DefaultValue::Value(value);
        self
    }

    /// Invokes the thunk to produce the value when this specification
    /// swallows a fault.
    #[must_use]
    pub fn default_with(mut self, thunk: impl Fn() -> T + 'static) -> Self {
        self.default = DefaultValue::Thunk(Rc::new(thunk));
        self
    }

    /// Whether this specification declares any type criteria.
    #[must_use]
    pub fn declares_types(&self) -> bool {
        !self.types.is_empty()
    }
}

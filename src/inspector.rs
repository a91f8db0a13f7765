//! Ordered first-match selection and field resolution over catch
//! specifications.

use crate::catcher::Callback;
use crate::config::Config;
use crate::fault::Fault;
use crate::spec::CatchSpec;
use crate::Level;

/// Resolves one fault against a catcher's specifications.
///
/// Selection runs in declaration order, first match wins. The fallback joins
/// the candidate list as a final catch-all only when no explicit
/// specifications exist, or when it declares type criteria of its own; a
/// type-less fallback alongside explicit specifications acts purely as a
/// settings provider.
///
/// Field resolution is per-field: list-valued fields (callbacks, known tags,
/// channels, message criteria) fall back to the fallback's value when the
/// specification's own list is empty, while tri-valued fields (report,
/// rethrow, level, default) fall back only when genuinely unset, so an
/// explicit `false` on a specification always wins.
pub struct Inspector<'a, T> {
    specs: &'a [CatchSpec<T>],
    fallback: &'a CatchSpec<T>,
    config: &'a Config,
}

impl<'a, T: Clone> Inspector<'a, T> {
    /// Creates an inspector over a catcher's rule set.
    #[must_use]
    pub fn new(specs: &'a [CatchSpec<T>], fallback: &'a CatchSpec<T>, config: &'a Config) -> Self {
        Self {
            specs,
            fallback,
            config,
        }
    }

    /// Selects the specification governing `fault`, or `None` when the fault
    /// is unhandled and must propagate untouched.
    #[must_use]
    pub fn select(&self, fault: &Fault) -> Option<&'a CatchSpec<T>> {
        let fallback_is_catch_all = self.specs.is_empty() || self.fallback.declares_types();

        let explicit = self.specs.iter().find(|spec| self.matches(spec, fault));
        if explicit.is_some() {
            return explicit;
        }

        if fallback_is_catch_all && self.matches(self.fallback, fault) {
            return Some(self.fallback);
        }
        None
    }

    /// Whether one specification claims the fault.
    fn matches(&self, spec: &CatchSpec<T>, fault: &Fault) -> bool {
        self.matches_type(spec, fault) && self.matches_message(spec, fault)
    }

    /// Type criteria use the specification's own list only; an empty list
    /// claims everything.
    fn matches_type(&self, spec: &CatchSpec<T>, fault: &Fault) -> bool {
        spec.types.is_empty() || spec.types.iter().any(|matcher| (matcher.check)(fault))
    }

    /// Message criteria inherit from the fallback when unset on the
    /// specification. Each criterion kind yields an independent tri-state
    /// result (unconfigured, passed, failed); the fault is claimed when at
    /// least one configured criterion passed, or none were configured at all.
    fn matches_message(&self, spec: &CatchSpec<T>, fault: &Fault) -> bool {
        let message = fault.message();

        let strings = non_empty(&spec.match_strings, &self.fallback.match_strings);
        let string_result = match strings {
            [] => None,
            strings => Some(strings.iter().any(|s| s == &message)),
        };

        let regexes = if spec.match_regexes.is_empty() {
            &self.fallback.match_regexes
        } else {
            &spec.match_regexes
        };
        let regex_result = match regexes.as_slice() {
            [] => None,
            regexes => Some(regexes.iter().any(|r| r.is_match(&message))),
        };

        match (string_result, regex_result) {
            (None, None) => true,
            (s, r) => s == Some(true) || r == Some(true),
        }
    }

    /// The callbacks to run for a matched specification.
    #[must_use]
    pub fn callbacks(&self, spec: &CatchSpec<T>) -> Vec<Callback> {
        non_empty(&spec.callbacks, &self.fallback.callbacks).to_vec()
    }

    /// The known-issue tags for a matched specification.
    #[must_use]
    pub fn known(&self, spec: &CatchSpec<T>) -> Vec<String> {
        non_empty(&spec.known, &self.fallback.known).to_vec()
    }

    /// The reporting channels, given the already-resolved known tags.
    #[must_use]
    pub fn channels(&self, spec: &CatchSpec<T>, known: &[String]) -> Vec<String> {
        let configured = non_empty(&spec.channels, &self.fallback.channels);
        if !configured.is_empty() {
            return configured.to_vec();
        }
        if !known.is_empty() && !self.config.channels_when_known.is_empty() {
            return self.config.channels_when_known.clone();
        }
        if !self.config.channels_when_not_known.is_empty() {
            return self.config.channels_when_not_known.clone();
        }
        self.config.default_channels.clone()
    }

    /// The reporting level.
    #[must_use]
    pub fn level(&self, spec: &CatchSpec<T>) -> Level {
        spec.level.or(self.fallback.level).unwrap_or(self.config.level)
    }

    /// Whether the fault is reported. Defaults to `true` when nothing in the
    /// chain decides.
    #[must_use]
    pub fn should_report(&self, spec: &CatchSpec<T>) -> bool {
        spec.report
            .or(self.fallback.report)
            .or(self.config.report)
            .unwrap_or(true)
    }

    /// Whether the fault is rethrown. Defaults to `false` when nothing in the
    /// chain decides.
    #[must_use]
    pub fn should_rethrow(&self, spec: &CatchSpec<T>) -> bool {
        spec.rethrow
            .or(self.fallback.rethrow)
            .or(self.config.rethrow)
            .unwrap_or(false)
    }

    /// The swallowed-fault result value, when one was configured anywhere in
    /// the chain.
    #[must_use]
    pub fn resolve_default(&self, spec: &CatchSpec<T>) -> Option<T> {
        if spec.default.is_set() {
            return spec.default.resolve();
        }
        self.fallback.default.resolve()
    }
}

/// The first of the two slices that is non-empty.
fn non_empty<'s, V>(own: &'s [V], fallback: &'s [V]) -> &'s [V] {
    if own.is_empty() {
        fallback
    } else {
        own
    }
}

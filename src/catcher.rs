//! The execution orchestrator: wraps a unit of work, catches its failures
//! and drives matching, context building, callbacks and disposition.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::{ContextCell, DiagnosticContext};
use crate::fault::{Fault, FaultId};
use crate::inspector::Inspector;
use crate::scope::Scope;
use crate::spec::CatchSpec;
use crate::{Level, Result};

static NEXT_CATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// What a callback tells the engine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep processing as resolved.
    Continue,
    /// Force both report and rethrow off: the failure is fully swallowed
    /// from this point on.
    Suppress,
}

/// The value handed to failure callbacks.
///
/// Exposes the fault and a shared handle to its diagnostic context; mutating
/// the context's disposition from a callback changes what the engine does
/// afterwards.
pub struct FailureEvent {
    pub(crate) fault: Fault,
    pub(crate) context: ContextCell,
}

impl FailureEvent {
    /// The fault being processed.
    #[must_use]
    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    /// The fault's diagnostic context.
    #[must_use]
    pub fn context(&self) -> &ContextCell {
        &self.context
    }
}

/// A registered failure callback.
pub type Callback = Rc<dyn Fn(&FailureEvent) -> Verdict>;

/// Releases a fault-to-context association when processing ends, however it
/// ends. Callbacks may panic; the association must not outlive processing.
struct ForgetGuard<'s> {
    scope: &'s Scope,
    id: FaultId,
}

impl Drop for ForgetGuard<'_> {
    fn drop(&mut self) {
        self.scope.forget_context(self.id);
    }
}

/// One wrapped unit of work plus its catch rules.
///
/// Created via [`Catcher::prime`] (configure, then [`execute`]) or run
/// immediately via [`Catcher::run`]. Builder methods before the first
/// [`catch_type`] call configure the fallback specification; after it, they
/// configure the most recently started specification — mirroring how rules
/// read at the call site:
///
/// ```rust,ignore
/// let result = Catcher::prime(&scope, fetch_users)
///     .catch_type::<DbError>()
///     .known("JIRA-1234")
///     .default_value(Vec::new())
///     .execute()?;
/// ```
///
/// [`execute`]: Catcher::execute
/// [`catch_type`]: Catcher::catch_type
pub struct Catcher<'s, T, F> {
    scope: &'s Scope,
    work: F,
    specs: Vec<CatchSpec<T>>,
    fallback: CatchSpec<T>,
    id: u64,
}

impl<'s, T, F> Catcher<'s, T, F>
where
    T: Clone,
    F: Fn() -> std::result::Result<T, Fault>,
{
    /// Prepares a catcher without executing it.
    #[must_use]
    pub fn prime(scope: &'s Scope, work: F) -> Self {
        Self {
            scope,
            work,
            specs: Vec::new(),
            fallback: CatchSpec::new(),
            id: NEXT_CATCHER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Runs a unit of work immediately with no explicit specifications: the
    /// fallback acts as a catch-all with default settings.
    pub fn run(scope: &'s Scope, work: F) -> std::result::Result<Option<T>, Fault> {
        Self::prime(scope, work).execute()
    }

    /// Starts a new specification claiming one error type. Subsequent
    /// builder calls configure this specification.
    #[must_use]
    pub fn catch_type<E: std::error::Error + 'static>(mut self) -> Self {
        self.specs.push(CatchSpec::for_type::<E>());
        self
    }

    /// Starts a new specification claiming every fault.
    #[must_use]
    pub fn catch_all(mut self) -> Self {
        self.specs.push(CatchSpec::new().catch_all());
        self
    }

    /// Attaches a fully-built specification.
    #[must_use]
    pub fn catches(mut self, spec: CatchSpec<T>) -> Self {
        self.specs.push(spec);
        self
    }

    /// The specification currently being configured.
    fn target(&mut self) -> &mut CatchSpec<T> {
        match self.specs.last_mut() {
            Some(spec) => spec,
            None => &mut self.fallback,
        }
    }

    fn map_target(
        mut self,
        f: impl FnOnce(CatchSpec<T>) -> Result<CatchSpec<T>>,
    ) -> Result<Self> {
        let taken = std::mem::take(self.target());
        *self.target() = f(taken)?;
        Ok(self)
    }

    /// Requires the fault message to equal the given string.
    #[must_use]
    pub fn match_message(mut self, message: impl Into<String>) -> Self {
        let target = self.target();
        target.match_strings.push(message.into());
        self
    }

    /// Requires the fault message to equal one of the given strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`](crate::Error::NoneProvided) when the list is empty.
    pub fn match_messages(self, messages: Vec<String>) -> Result<Self> {
        self.map_target(|spec| spec.match_messages(messages))
    }

    /// Requires the fault message to contain a match of the given pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegex`](crate::Error::InvalidRegex) when the pattern does not compile.
    pub fn match_regex(self, pattern: &str) -> Result<Self> {
        self.map_target(|spec| spec.match_regex(pattern))
    }

    /// Requires the fault message to contain a match of one of the patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`](crate::Error::NoneProvided) when the list is empty, or
    /// [`Error::InvalidRegex`](crate::Error::InvalidRegex) when a pattern does not compile.
    pub fn match_regexes(self, patterns: Vec<&str>) -> Result<Self> {
        self.map_target(|spec| spec.match_regexes(patterns))
    }

    /// Attaches a callback to the current specification.
    #[must_use]
    pub fn callback(mut self, callback: impl Fn(&FailureEvent) -> Verdict + 'static) -> Self {
        self.target().callbacks.push(Rc::new(callback));
        self
    }

    /// Tags resolved faults with a known-issue label.
    #[must_use]
    pub fn known(mut self, tag: impl Into<String>) -> Self {
        self.target().known.push(tag.into());
        self
    }

    /// Tags resolved faults with several known-issue labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`](crate::Error::NoneProvided) when the list is empty.
    pub fn known_tags(self, tags: Vec<String>) -> Result<Self> {
        self.map_target(|spec| spec.known_tags(tags))
    }

    /// Reports resolved faults on the given channel.
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.target().channels.push(channel.into());
        self
    }

    /// Reports resolved faults on the given channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`](crate::Error::NoneProvided) when the list is empty.
    pub fn channels(self, channels: Vec<String>) -> Result<Self> {
        self.map_target(|spec| spec.channels(channels))
    }

    /// Sets the reporting level.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.target().level = Some(level);
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
        self.target().report = Some(report);
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
        self.target().rethrow = Some(rethrow);
        self
    }

    /// Shorthand for `rethrow(false)`.
    #[must_use]
    pub fn dont_rethrow(self) -> Self {
        self.rethrow(false)
    }

    /// Returns the given value when the current specification swallows a
    /// fault.
    #[must_use]
    pub fn default_value(mut self, value: T) -> Self {
        let target = self.target();
        target.default = crate::spec::DefaultValue::Value(value);
        self
    }

    /// Invokes the thunk to produce the swallowed-fault value.
    #[must_use]
    pub fn default_with(mut self, thunk: impl Fn() -> T + 'static) -> Self {
        let target = self.target();
        target.default = crate::spec::DefaultValue::Thunk(Rc::new(thunk));
        self
    }

    /// Runs the wrapped work and resolves any failure.
    ///
    /// May be invoked repeatedly: each invocation re-runs the work from
    /// scratch and resolves its own failure independently.
    ///
    /// Returns `Ok(Some(value))` when the work succeeded or a default was
    /// substituted, `Ok(None)` when the failure was swallowed with no default
    /// configured, and `Err` when the failure was unmatched or rethrown.
    ///
    /// # Errors
    ///
    /// Propagates the original fault when no specification claims it or the
    /// resolved disposition is rethrow. Engine errors hit while building the
    /// diagnostic context travel the same way, wrapped into a fault.
    pub fn execute(&self) -> std::result::Result<Option<T>, Fault> {
        self.scope.push_boundary(self.id);

        match (self.work)() {
            Ok(value) => Ok(Some(value)),
            Err(fault) => self.process(fault),
        }
    }

    /// Resolves one caught fault into its final disposition.
    fn process(&self, fault: Fault) -> std::result::Result<Option<T>, Fault> {
        let inspector = Inspector::new(&self.specs, &self.fallback, self.scope.config());

        // unmatched: propagate untouched, with no side effects at all
        let Some(spec) = inspector.select(&fault) else {
            tracing::trace!(%fault, "no specification claimed the fault");
            return Err(fault);
        };
        tracing::debug!(fault_id = %fault.id(), %fault, "fault claimed");
        self.scope.remember_fault(fault.clone());

        let known = inspector.known(spec);
        self.scope.patch_boundary_known(self.id, &known);

        let mut report = inspector.should_report(spec);
        let mut rethrow = inspector.should_rethrow(spec);

        if !report && !rethrow {
            return Ok(inspector.resolve_default(spec));
        }

        let global = self.scope.global_callbacks();
        let own = inspector.callbacks(spec);

        if !global.is_empty() || !own.is_empty() || report {
            let level = inspector.level(spec);
            let channels = inspector.channels(spec, &known);

            let context = self
                .scope
                .with_tracker(|tracker| {
                    DiagnosticContext::assemble(
                        fault.clone(),
                        tracker,
                        self.scope.config(),
                        Some(self.id),
                        channels,
                        level,
                        report,
                        rethrow,
                    )
                })
                .map_err(Fault::new)?;
            let cell = ContextCell::new(context);

            self.scope.remember_context(fault.id(), cell.clone());
            let _guard = ForgetGuard {
                scope: self.scope,
                id: fault.id(),
            };

            let event = FailureEvent {
                fault: fault.clone(),
                context: cell.clone(),
            };
            for callback in global.iter().chain(own.iter()) {
                {
                    let context = cell.read();
                    if !context.should_report() && !context.should_rethrow() {
                        break;
                    }
                }
                if callback(&event) == Verdict::Suppress {
                    let mut context = cell.write();
                    context.set_report(false);
                    context.set_rethrow(false);
                }
            }

            // disposition follows the possibly callback-mutated flags
            {
                let context = cell.read();
                report = context.should_report();
                rethrow = context.should_rethrow();
            }

            if report {
                self.scope.reporter().report(&fault, Some(&cell));
            }
        }

        tracing::trace!(fault_id = %fault.id(), report, rethrow, "disposition resolved");
        if rethrow {
            return Err(fault);
        }
        Ok(inspector.resolve_default(spec))
    }
}

//! The per-failure diagnostic context.

mod build;

pub(crate) use build::build;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::callstack::{CallStack, MetaRecord};
use crate::config::Config;
use crate::fault::Fault;
use crate::stack::MetaCallStack;
use crate::{Error, Level, Result};

/// The assembled diagnostic bundle for one failure.
///
/// Carries the fault, the annotated call stack, the aggregate metadata and
/// known-tag views, and the resolved disposition settings. Callbacks receive
/// the context through a [`ContextCell`] and may override the disposition
/// before it is applied.
#[derive(Debug, Clone)]
pub struct DiagnosticContext {
    fault: Fault,
    stack: CallStack,
    meta: Vec<MetaRecord>,
    known: Vec<String>,
    channels: Vec<String>,
    level: Level,
    report: bool,
    rethrow: bool,
}

impl DiagnosticContext {
    /// Builds the context for one fault.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetaType`] when tracked metadata cannot be
    /// resolved into typed records.
    pub(crate) fn assemble(
        fault: Fault,
        tracker: &mut MetaCallStack,
        config: &Config,
        caught_by: Option<u64>,
        channels: Vec<String>,
        level: Level,
        report: bool,
        rethrow: bool,
    ) -> Result<Self> {
        let built = build(&fault, tracker, config, caught_by)?;
        Ok(Self {
            fault,
            stack: built.stack,
            meta: built.meta,
            known: built.known,
            channels,
            level,
            report,
            rethrow,
        })
    }

    /// The fault this context describes.
    #[must_use]
    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    /// A copy of the call stack, oldest call first.
    #[must_use]
    pub fn call_stack(&self) -> CallStack {
        self.stack.clone()
    }

    /// A copy of the call stack in trace order, innermost call first.
    #[must_use]
    pub fn trace(&self) -> CallStack {
        let mut stack = self.stack.clone();
        stack.reverse();
        stack
    }

    /// All metadata records, in frame order (oldest first).
    #[must_use]
    pub fn meta(&self) -> &[MetaRecord] {
        &self.meta
    }

    /// The metadata records of one kind tag, in frame order; see
    /// [`MetaPayload::kind`](crate::callstack::MetaPayload::kind).
    #[must_use]
    pub fn meta_of_kind(&self, kind: &str) -> Vec<&MetaRecord> {
        self.meta
            .iter()
            .filter(|record| record.kind() == kind)
            .collect()
    }

    /// All known-issue tags, in frame order (oldest first).
    #[must_use]
    pub fn known(&self) -> &[String] {
        &self.known
    }

    /// The channels the failure will be reported on.
    #[must_use]
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Overrides the reporting channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoneProvided`] when the list is empty.
    pub fn set_channels(&mut self, channels: Vec<String>) -> Result<()> {
        if channels.is_empty() {
            return Err(Error::NoneProvided {
                method: "set_channels",
            });
        }
        self.channels = channels;
        Ok(())
    }

    /// The resolved reporting level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Overrides the reporting level.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    /// Reports at debug level.
    pub fn debug(&mut self) {
        self.set_level(Level::Debug);
    }

    /// Reports at info level.
    pub fn info(&mut self) {
        self.set_level(Level::Info);
    }

    /// Reports at notice level.
    pub fn notice(&mut self) {
        self.set_level(Level::Notice);
    }

    /// Reports at warning level.
    pub fn warning(&mut self) {
        self.set_level(Level::Warning);
    }

    /// Reports at error level.
    pub fn error(&mut self) {
        self.set_level(Level::Error);
    }

    /// Reports at critical level.
    pub fn critical(&mut self) {
        self.set_level(Level::Critical);
    }

    /// Reports at alert level.
    pub fn alert(&mut self) {
        self.set_level(Level::Alert);
    }

    /// Reports at emergency level.
    pub fn emergency(&mut self) {
        self.set_level(Level::Emergency);
    }

    /// Whether the failure will be reported.
    #[must_use]
    pub fn should_report(&self) -> bool {
        self.report
    }

    /// Overrides the report decision.
    pub fn set_report(&mut self, report: bool) {
        self.report = report;
    }

    /// Whether the failure will be rethrown.
    #[must_use]
    pub fn should_rethrow(&self) -> bool {
        self.rethrow
    }

    /// Overrides the rethrow decision.
    pub fn set_rethrow(&mut self, rethrow: bool) {
        self.rethrow = rethrow;
    }
}

/// A shared, mutable handle to one [`DiagnosticContext`].
///
/// Cells clone cheaply and all clones view the same context, so a mutation
/// made inside a callback is visible to the engine when it applies the final
/// disposition.
#[derive(Debug, Clone)]
pub struct ContextCell(Rc<RefCell<DiagnosticContext>>);

impl ContextCell {
    /// Wraps a context in a shared cell.
    #[must_use]
    pub fn new(context: DiagnosticContext) -> Self {
        Self(Rc::new(RefCell::new(context)))
    }

    /// Borrows the context immutably.
    ///
    /// # Panics
    ///
    /// Panics if the context is currently borrowed mutably.
    #[must_use]
    pub fn read(&self) -> Ref<'_, DiagnosticContext> {
        self.0.borrow()
    }

    /// Borrows the context mutably.
    ///
    /// # Panics
    ///
    /// Panics if the context is currently borrowed.
    #[must_use]
    pub fn write(&self) -> RefMut<'_, DiagnosticContext> {
        self.0.borrow_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::RawFrame;

    fn context() -> DiagnosticContext {
        let fault = Fault::with_trace(
            std::io::Error::other("boom"),
            vec![
                RawFrame::at("deep.rs", 30, "deep"),
                RawFrame::at("main.rs", 10, "main"),
            ],
        );
        DiagnosticContext::assemble(
            fault,
            &mut MetaCallStack::new(),
            &Config::new(),
            None,
            vec!["default".into()],
            Level::Error,
            true,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_trace_is_the_reversed_call_stack() {
        let context = context();
        let stack = context.call_stack();
        let trace = context.trace();

        assert_eq!(stack[0].line(), Some(10));
        assert_eq!(trace[0].line(), Some(30));
        assert_eq!(stack.len(), trace.len());
    }

    #[test]
    fn test_call_stack_returns_a_defensive_copy() {
        let context = context();
        let mut copy = context.call_stack();
        copy.reverse();

        // the context's own stack is unaffected
        assert_eq!(context.call_stack()[0].line(), Some(10));
    }

    #[test]
    fn test_set_channels_requires_at_least_one() {
        let mut context = context();
        assert!(context.set_channels(vec![]).is_err());
        context.set_channels(vec!["ops".into()]).unwrap();
        assert_eq!(context.channels(), ["ops".to_string()]);
    }

    #[test]
    fn test_level_shorthands_override_the_resolved_level() {
        let mut context = context();
        assert_eq!(context.level(), Level::Error);

        context.warning();
        assert_eq!(context.level(), Level::Warning);

        context.emergency();
        assert_eq!(context.level(), Level::Emergency);
    }

    #[test]
    fn test_cell_shares_mutations_between_clones() {
        let cell = ContextCell::new(context());
        let other = cell.clone();

        other.write().set_rethrow(true);
        assert!(cell.read().should_rethrow());
    }
}

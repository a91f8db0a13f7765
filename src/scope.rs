//! The per-execution-context home of all shared engine state.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::catcher::Callback;
use crate::config::Config;
use crate::context::ContextCell;
use crate::fault::{Fault, FaultId};
use crate::report::{Reporter, TracingReporter};
use crate::stack::{kinds, normalise_capture, BacktraceSource, MetaCallStack, MetaValue, StackSource};
use crate::{FailureEvent, Verdict};

/// One logical execution context: the tracker, the global callbacks, the
/// fault-to-context association table, the configuration and the collaborator
/// seams.
///
/// A `Scope` is the explicit replacement for ambient global state: hosts
/// create one per logical unit (one request, one job, one test) and pass it
/// to every [`Catcher`](crate::Catcher). Scopes are single-threaded by
/// design; a multi-threaded host gives each thread its own.
pub struct Scope {
    tracker: RefCell<MetaCallStack>,
    global_callbacks: RefCell<Vec<Callback>>,
    contexts: RefCell<Vec<(FaultId, ContextCell)>>,
    last_fault: RefCell<Option<Fault>>,
    config: Config,
    reporter: Rc<dyn Reporter>,
    source: Rc<dyn StackSource>,
}

impl Scope {
    /// Creates a scope with live stack capture and `tracing` reporting.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            tracker: RefCell::new(MetaCallStack::new()),
            global_callbacks: RefCell::new(Vec::new()),
            contexts: RefCell::new(Vec::new()),
            last_fault: RefCell::new(None),
            config,
            reporter: Rc::new(TracingReporter),
            source: Rc::new(BacktraceSource),
        }
    }

    /// Replaces the reporting sink.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Rc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces the stack-capture source.
    #[must_use]
    pub fn with_source(mut self, source: Rc<dyn StackSource>) -> Self {
        self.source = source;
        self
    }

    /// The scope's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Records a free-text summary of what the code is currently doing.
    ///
    /// The summary is attached to the caller's position in the tracked call
    /// stack and appears in diagnostics for failures that pass through that
    /// position. No-op when diagnostics are disabled.
    pub fn summary(&self, text: impl Into<String>) {
        if !self.config.enabled {
            return;
        }
        let stack = normalise_capture(self.source.capture(), 0);
        self.tracker.borrow_mut().push_meta_data(
            kinds::SUMMARY,
            MetaValue::Text(text.into()),
            stack,
            false,
        );
    }

    /// Records structured context data at the caller's position.
    ///
    /// Object values contribute their entries directly; any other value is
    /// stored under a `"value"` key. No-op when diagnostics are disabled.
    pub fn context(&self, data: Value) {
        if !self.config.enabled {
            return;
        }
        let data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        let stack = normalise_capture(self.source.capture(), 0);
        self.tracker.borrow_mut().push_meta_data(
            kinds::CONTEXT,
            MetaValue::Data(data),
            stack,
            false,
        );
    }

    /// Registers a callback that runs before any per-catcher callbacks, for
    /// every fault resolved within this scope.
    pub fn global_callback(&self, callback: impl Fn(&FailureEvent) -> Verdict + 'static) {
        self.global_callbacks.borrow_mut().push(Rc::new(callback));
    }

    /// The diagnostic context associated with a fault, while its failure is
    /// being processed.
    #[must_use]
    pub fn context_for(&self, fault: &Fault) -> Option<ContextCell> {
        self.contexts
            .borrow()
            .iter()
            .find(|(id, _)| *id == fault.id())
            .map(|(_, cell)| cell.clone())
    }

    /// The most recently associated diagnostic context, if any.
    #[must_use]
    pub fn latest_context(&self) -> Option<ContextCell> {
        self.contexts.borrow().last().map(|(_, cell)| cell.clone())
    }

    /// The most recently claimed fault, if any.
    ///
    /// Lets callers inspect a failure that a catcher swallowed, after
    /// [`execute`](crate::Catcher::execute) has already returned. Unclaimed
    /// faults propagate as `Err` and are not recorded here.
    #[must_use]
    pub fn last_fault(&self) -> Option<Fault> {
        self.last_fault.borrow().clone()
    }

    /// Marks an execution boundary at the caller's position.
    pub(crate) fn push_boundary(&self, owner: u64) {
        if !self.config.enabled {
            return;
        }
        let stack = normalise_capture(self.source.capture(), 0);
        self.tracker.borrow_mut().push_meta_data(
            kinds::BOUNDARY,
            MetaValue::Marker {
                owner,
                known: Vec::new(),
            },
            stack,
            true,
        );
    }

    /// Patches a boundary record with its resolved known tags. Boundaries
    /// without tags are left untouched.
    pub(crate) fn patch_boundary_known(&self, owner: u64, known: &[String]) {
        if known.is_empty() || !self.config.enabled {
            return;
        }
        self.tracker.borrow_mut().replace_meta_value(
            kinds::BOUNDARY,
            |value| matches!(value, MetaValue::Marker { owner: o, .. } if *o == owner),
            MetaValue::Marker {
                owner,
                known: known.to_vec(),
            },
        );
    }

    pub(crate) fn with_tracker<R>(&self, f: impl FnOnce(&mut MetaCallStack) -> R) -> R {
        f(&mut self.tracker.borrow_mut())
    }

    pub(crate) fn global_callbacks(&self) -> Vec<Callback> {
        self.global_callbacks.borrow().clone()
    }

    pub(crate) fn remember_fault(&self, fault: Fault) {
        *self.last_fault.borrow_mut() = Some(fault);
    }

    pub(crate) fn remember_context(&self, id: FaultId, cell: ContextCell) {
        self.contexts.borrow_mut().push((id, cell));
    }

    pub(crate) fn forget_context(&self, id: FaultId) {
        self.contexts.borrow_mut().retain(|(held, _)| *held != id);
    }

    pub(crate) fn reporter(&self) -> Rc<dyn Reporter> {
        self.reporter.clone()
    }
}

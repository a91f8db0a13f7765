//! # faultline Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! from the faultline library. Import this module to get quick access to the
//! essential types for wrapping work and inspecting failures.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The error type for configuration and reconstruction operations
pub use crate::Error;

/// The result type used throughout faultline
pub use crate::Result;

/// A failure captured inside a wrapped unit of work
pub use crate::{Fault, FaultId};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The per-execution-context home of all shared engine state
pub use crate::Scope;

/// The execution orchestrator: wrap work, configure catch rules, execute
pub use crate::Catcher;

/// Host configuration
pub use crate::Config;

// ================================================================================================
// Catch Rules
// ================================================================================================

/// One catch rule and its typed default value
pub use crate::{CatchSpec, DefaultValue, TypeMatcher};

/// The reporting level ladder
pub use crate::Level;

// ================================================================================================
// Callbacks and Diagnostics
// ================================================================================================

/// The value handed to failure callbacks, and what callbacks answer with
pub use crate::{FailureEvent, Verdict};

/// The assembled per-failure diagnostic bundle and its shared handle
pub use crate::{ContextCell, DiagnosticContext};

/// The built diagnostic call stack and its frame model
pub use crate::callstack::{CallStack, Frame, MetaPayload, MetaRecord};

// ================================================================================================
// Collaborator Seams
// ================================================================================================

/// Reporting sinks
pub use crate::{NullReporter, Reporter, TracingReporter};

/// Stack capture sources (scripted capture supports deterministic tests)
pub use crate::stack::{BacktraceSource, RawFrame, ScriptedSource, StackSource};

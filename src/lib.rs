// Copyright 2026 The faultline Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # faultline
//!
//! [![Crates.io](https://img.shields.io/crates/v/faultline.svg)](https://crates.io/crates/faultline)
//! [![Documentation](https://docs.rs/faultline/badge.svg)](https://docs.rs/faultline)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/faultline-rs/faultline/blob/main/LICENSE)
//!
//! An error-interception and contextual-diagnostics layer: wrap a unit of
//! work, catch failures that occur anywhere inside it (including through
//! nested wrapped calls), attach positional context gathered at every call
//! site along the way, and decide — via an ordered rule set — whether each
//! failure is logged, rethrown, or replaced with a fallback value.
//!
//! ## Features
//!
//! - **Call-site context tracking** - `summary()` / `context()` calls attach
//!   facts to the current call position; facts fall out of scope when control
//!   returns past them or takes a sibling call path
//! - **Fused diagnostics** - a failure's captured trace is merged with the
//!   tracked facts into an ordered, queryable call stack, annotated with
//!   thrown-here / caught-here / last-application-frame markers
//! - **Ordered catch rules** - per-type specifications with message criteria,
//!   callbacks, known-issue tags, channels, levels and typed default values,
//!   resolved first-match with field-level inheritance from a fallback rule
//! - **Explicit scoping** - all shared state lives in a [`Scope`] the host
//!   creates per logical execution unit; nothing is ambient or global
//!
//! ## Quick Start
//!
//! Add `faultline` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! faultline = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! ```rust,no_run
//! use faultline::prelude::*;
//! use serde_json::json;
//!
//! let scope = Scope::new(Config::new());
//!
//! scope.summary("importing the nightly feed");
//! scope.context(json!({ "feed": "nightly" }));
//!
//! let rows = Catcher::prime(&scope, || import_feed(&scope))
//!     .catch_type::<std::io::Error>()
//!     .known("OPS-1234")
//!     .warning()
//!     .default_value(0)
//!     .execute()?;
//! # fn import_feed(_scope: &Scope) -> std::result::Result<usize, Fault> { Ok(0) }
//! # Ok::<(), faultline::Fault>(())
//! ```
//!
//! ### Inspecting a failure
//!
//! Callbacks receive a [`FailureEvent`] carrying the fault and its
//! [`DiagnosticContext`]; the context exposes the annotated call stack and
//! the resolved disposition, which callbacks may override:
//!
//! ```rust,no_run
//! # use faultline::prelude::*;
//! # let scope = Scope::new(Config::new());
//! let result = Catcher::prime(&scope, || Err::<(), _>(faultline::fault!("boom")))
//!     .catch_all()
//!     .callback(|event| {
//!         let context = event.context().read();
//!         for frame in &context.call_stack() {
//!             println!("{}:{:?} {:?}", frame.file(), frame.line(), frame.meta());
//!         }
//!         Verdict::Continue
//!     })
//!     .execute();
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - convenient re-exports of the commonly used types
//! - [`Scope`] - per-execution-context state: the tracker, global callbacks,
//!   fault-to-context associations, configuration and collaborator seams
//! - [`Catcher`] - the orchestrator: wraps work, drives matching, context
//!   building, callbacks and disposition
//! - [`CatchSpec`] - one catch rule; [`inspector`] resolves rules first-match
//!   with fallback inheritance
//! - [`callstack`] - the built diagnostic stack model; [`stack`] - raw
//!   capture and the meta call-stack tracker
//! - [`Error`] and [`Result`] - configuration and reconstruction errors;
//!   failures inside wrapped work travel as [`Fault`] values instead

pub mod callstack;
pub mod stack;

mod catcher;
mod config;
mod context;
mod error;
mod fault;
pub mod inspector;
mod level;
pub mod prelude;
mod report;
mod scope;
mod spec;

pub use catcher::{Callback, Catcher, FailureEvent, Verdict};
pub use config::Config;
pub use context::{ContextCell, DiagnosticContext};
pub use error::{Error, Result};
pub use fault::{Fault, FaultId};
pub use level::Level;
pub use report::{NullReporter, Reporter, TracingReporter};
pub use scope::Scope;
pub use spec::{CatchSpec, DefaultValue, TypeMatcher};

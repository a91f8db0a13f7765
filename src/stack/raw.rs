//! Raw stack frames and the capture seam.
//!
//! The tracker and the diagnostic builder never capture the live call stack
//! themselves; they consume [`RawFrame`] sequences produced by a
//! [`StackSource`]. The default [`BacktraceSource`] symbolises the real stack,
//! while [`ScriptedSource`] replays queued stacks so hosts can drive failure
//! paths deterministically in their own tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;

/// One position in a captured call stack.
///
/// Fields are optional because live capture can produce frames without debug
/// information. Frames missing a source position are treated as phantom
/// frames: metadata is never attached to them, because they would disappear
/// the next time the stack is inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawFrame {
    /// The source file the call was made from.
    pub file: Option<PathBuf>,
    /// The line the call was made from.
    pub line: Option<u32>,
    /// The function containing the call site.
    pub function: Option<String>,
}

impl RawFrame {
    /// Creates a frame from its parts.
    #[must_use]
    pub fn new(file: Option<PathBuf>, line: Option<u32>, function: Option<String>) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Creates a fully-positioned frame.
    #[must_use]
    pub fn at(file: impl Into<PathBuf>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            function: Some(function.into()),
        }
    }

    /// Whether this frame carries a usable source position.
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.file.is_some() && self.line.is_some()
    }

    /// Whether two frames describe the same source position (file + line).
    ///
    /// This is the comparison used when matching tracked stacks against an
    /// error's captured trace, where function names are not reliable.
    #[must_use]
    pub fn same_position(&self, other: &RawFrame) -> bool {
        self.file == other.file && self.line == other.line
    }

    /// The frame's file as a displayable string (empty when unknown).
    #[must_use]
    pub fn file_display(&self) -> String {
        self.file
            .as_ref()
            .map(|f| f.display().to_string())
            .unwrap_or_default()
    }
}

/// A provider of call-stack captures.
///
/// Implementations return frames innermost-first (the way backtraces are
/// walked). Callers normalise them with [`normalise_capture`] before storing.
pub trait StackSource {
    /// Captures the current call stack, innermost frame first.
    fn capture(&self) -> Vec<RawFrame>;
}

/// Captures the live call stack via the `backtrace` crate.
///
/// Frames belonging to this crate and to the capture machinery itself are
/// filtered out, so the innermost returned frame is the external call site.
/// Symbol availability depends on debug info being present in the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceSource;

impl StackSource for BacktraceSource {
    fn capture(&self) -> Vec<RawFrame> {
        let bt = backtrace::Backtrace::new();

        let mut frames = Vec::new();
        for frame in bt.frames() {
            for symbol in frame.symbols() {
                let function = symbol.name().map(|n| n.to_string());
                if is_internal_symbol(function.as_deref()) {
                    continue;
                }
                frames.push(RawFrame::new(
                    symbol.filename().map(PathBuf::from),
                    symbol.lineno(),
                    function,
                ));
            }
        }
        frames
    }
}

/// Whether a symbol belongs to the capture machinery rather than user code.
fn is_internal_symbol(name: Option<&str>) -> bool {
    let Some(name) = name else {
        return false;
    };
    name.starts_with("backtrace::") || name.starts_with(concat!(env!("CARGO_PKG_NAME"), "::"))
}

/// Replays queued stack captures, innermost-first, one per [`capture`] call.
///
/// Once the queue is exhausted the last stack is repeated, so a scripted
/// scenario does not have to count every capture the engine performs.
///
/// [`capture`]: StackSource::capture
#[derive(Debug, Default)]
pub struct ScriptedSource {
    stacks: RefCell<VecDeque<Vec<RawFrame>>>,
    last: RefCell<Vec<RawFrame>>,
}

impl ScriptedSource {
    /// Creates a source that replays the given stacks in order.
    #[must_use]
    pub fn new(stacks: Vec<Vec<RawFrame>>) -> Self {
        Self {
            stacks: RefCell::new(stacks.into()),
            last: RefCell::new(Vec::new()),
        }
    }

    /// Queues one more stack to replay.
    pub fn push(&self, stack: Vec<RawFrame>) {
        self.stacks.borrow_mut().push_back(stack);
    }
}

impl StackSource for ScriptedSource {
    fn capture(&self) -> Vec<RawFrame> {
        match self.stacks.borrow_mut().pop_front() {
            Some(stack) => {
                *self.last.borrow_mut() = stack.clone();
                stack
            }
            None => self.last.borrow().clone(),
        }
    }
}

/// Normalises a raw capture into the tracker's storage order.
///
/// Drops `skip` innermost frames, then drops any further leading frames that
/// are missing a source position (phantom frames produced by dispatch
/// indirection or missing debug info), and finally reverses the sequence so
/// it is oldest-call-first.
#[must_use]
pub fn normalise_capture(frames: Vec<RawFrame>, skip: usize) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = frames.into_iter().skip(skip).collect();

    let keep_from = frames
        .iter()
        .position(RawFrame::has_position)
        .unwrap_or(frames.len());
    frames.drain(..keep_from);

    frames.reverse();
    frames
}

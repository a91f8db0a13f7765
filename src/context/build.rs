//! Fusing a fault's trace with tracked metadata into a diagnostic stack.

use crate::callstack::{CallStack, Frame, MetaPayload, MetaRecord};
use crate::config::Config;
use crate::fault::Fault;
use crate::stack::MetaCallStack;
use crate::Result;

/// The fused output: the built stack, the aggregate metadata list (frame
/// order, oldest first) and the aggregate known-tag list.
pub(crate) struct BuiltStack {
    pub stack: CallStack,
    pub meta: Vec<MetaRecord>,
    pub known: Vec<String>,
}

/// Builds the diagnostic call stack for one fault.
///
/// The fault's trace (innermost first) is reversed into oldest-call-first
/// order, the tracker is pruned against it, and each position is wrapped into
/// a [`Frame`] carrying the tracker's metadata for that position. Marker
/// records are then appended: the deepest application frame, the throw site
/// (the innermost frame) and the frame whose execution boundary resolved the
/// failure.
///
/// When diagnostics are disabled the stack still carries real frames for
/// location information, but no metadata and no markers, and the tracker is
/// left untouched.
pub(crate) fn build(
    fault: &Fault,
    tracker: &mut MetaCallStack,
    config: &Config,
    caught_by: Option<u64>,
) -> Result<BuiltStack> {
    let mut trace: Vec<_> = fault.trace().to_vec();
    trace.reverse();

    if !config.enabled {
        let frames = trace
            .into_iter()
            .map(|position| {
                let is_application = classify(config, &position);
                Frame::new(position, Vec::new(), is_application)
            })
            .collect();
        return Ok(BuiltStack {
            stack: CallStack::new(frames),
            meta: Vec::new(),
            known: Vec::new(),
        });
    }

    tracker.prune_for_trace(&trace);

    let mut frames = Vec::with_capacity(trace.len());
    for (index, position) in trace.into_iter().enumerate() {
        let mut meta = Vec::new();
        for stored in tracker.meta_at(index) {
            meta.push(MetaRecord::from_stored(stored)?);
        }
        let is_application = classify(config, &position);
        frames.push(Frame::new(position, meta, is_application));
    }

    tag_markers(&mut frames, caught_by);

    let mut meta = Vec::new();
    let mut known = Vec::new();
    for frame in &frames {
        for record in frame.meta() {
            if let Some(tags) = record.known_tags() {
                known.extend(tags.iter().cloned());
            }
            meta.push(record.clone());
        }
    }

    Ok(BuiltStack {
        stack: CallStack::new(frames),
        meta,
        known,
    })
}

/// Whether a captured position counts as application code.
///
/// Positions without a source file can only be classified when no project
/// root is configured (in which case everything is application code).
fn classify(config: &Config, position: &crate::stack::RawFrame) -> bool {
    match &position.file {
        Some(file) => config.is_application_path(file),
        None => config.project_root.is_none(),
    }
}

/// Appends the derived marker records to the built frames.
fn tag_markers(frames: &mut [Frame], caught_by: Option<u64>) {
    if frames.is_empty() {
        return;
    }

    if let Some(index) = frames.iter().rposition(Frame::is_application_frame) {
        let marker = MetaRecord::new(
            frames[index].position().clone(),
            MetaPayload::LastApplicationFrame,
        );
        frames[index] = frames[index].with_extra_meta(marker);
    }

    let last = frames.len() - 1;
    let thrown = MetaRecord::new(frames[last].position().clone(), MetaPayload::ExceptionThrown);
    frames[last] = frames[last].with_extra_meta(thrown);

    if let Some(owner) = caught_by {
        let caught_index = frames.iter().position(|frame| {
            frame.meta().iter().any(|record| {
                matches!(
                    record.payload(),
                    MetaPayload::ExecutionMarker { owner: o, .. } if *o == owner
                )
            })
        });
        if let Some(index) = caught_index {
            let marker = MetaRecord::new(
                frames[index].position().clone(),
                MetaPayload::ExceptionCaught,
            );
            frames[index] = frames[index].with_extra_meta(marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{kinds, MetaValue, RawFrame};

    fn frame(file: &str, line: u32) -> RawFrame {
        RawFrame::at(file, line, "f")
    }

    fn fault_with_trace(trace: Vec<RawFrame>) -> Fault {
        Fault::with_trace(std::io::Error::other("boom"), trace)
    }

    #[test]
    fn test_fuses_metadata_by_position() {
        let mut tracker = MetaCallStack::new();
        tracker.push_meta_data(
            kinds::SUMMARY,
            MetaValue::Text("loading".into()),
            vec![frame("main.rs", 10), frame("app.rs", 20)],
            false,
        );

        // innermost-first trace matching the tracked stack by position
        let fault = fault_with_trace(vec![frame("app.rs", 20), frame("main.rs", 10)]);
        let built = build(&fault, &mut tracker, &Config::new(), None).unwrap();

        assert_eq!(built.stack.len(), 2);
        assert!(built.stack[0].meta().is_empty());
        assert!(matches!(
            built.stack[1].meta()[0].payload(),
            MetaPayload::Summary(text) if text == "loading"
        ));
    }

    #[test]
    fn test_marks_throw_site_and_last_application_frame() {
        let mut tracker = MetaCallStack::new();
        let config = Config::new().with_project_root("/project");

        let fault = fault_with_trace(vec![
            frame("/project/vendor/lib/src/x.rs", 5),
            frame("/project/src/app.rs", 20),
            frame("/project/src/main.rs", 10),
        ]);
        let built = build(&fault, &mut tracker, &config, None).unwrap();

        assert_eq!(built.stack.exception_thrown_frame_index(), Some(2));
        assert_eq!(built.stack.last_application_frame_index(), Some(1));
        assert!(built.stack.exception_caught_frame().is_none());
    }

    #[test]
    fn test_marks_the_resolving_boundary_as_caught() {
        let mut tracker = MetaCallStack::new();
        tracker.push_meta_data(
            kinds::BOUNDARY,
            MetaValue::Marker {
                owner: 9,
                known: vec!["ISSUE-1".into()],
            },
            vec![frame("main.rs", 10)],
            true,
        );

        let fault = fault_with_trace(vec![frame("deep.rs", 30), frame("main.rs", 10)]);
        let built = build(&fault, &mut tracker, &Config::new(), Some(9)).unwrap();

        assert_eq!(built.stack.exception_caught_frame_index(), Some(0));
        assert_eq!(built.known, vec!["ISSUE-1".to_string()]);
    }

    #[test]
    fn test_disabled_builds_plain_frames() {
        let mut tracker = MetaCallStack::new();
        tracker.push_meta_data(
            kinds::SUMMARY,
            MetaValue::Text("ignored".into()),
            vec![frame("main.rs", 10)],
            false,
        );

        let config = Config::new().disabled();
        let fault = fault_with_trace(vec![frame("deep.rs", 30), frame("main.rs", 10)]);
        let built = build(&fault, &mut tracker, &config, Some(1)).unwrap();

        assert_eq!(built.stack.len(), 2);
        assert!(built.meta.is_empty());
        assert!(built.known.is_empty());
        assert!(built.stack.exception_thrown_frame().is_none());
        assert!(built.stack.last_application_frame().is_none());
    }

    #[test]
    fn test_stale_metadata_is_pruned_before_fusing() {
        let mut tracker = MetaCallStack::new();
        tracker.push_meta_data(
            kinds::SUMMARY,
            MetaValue::Text("sibling branch".into()),
            vec![frame("main.rs", 10), frame("a.rs", 5), frame("a.rs", 50)],
            false,
        );

        // the failure comes from a different branch at the same depth
        let fault = fault_with_trace(vec![frame("b.rs", 70), frame("b.rs", 7), frame("main.rs", 10)]);
        let built = build(&fault, &mut tracker, &Config::new(), None).unwrap();

        let summaries: Vec<_> = built
            .meta
            .iter()
            .filter(|r| matches!(r.payload(), MetaPayload::Summary(_)))
            .collect();
        assert!(summaries.is_empty());
    }
}

//! Call-site tracking through the full pipeline: summaries and context data
//! recorded mid-work must land on the right diagnostic frames, and must fall
//! out of scope with the call paths that recorded them.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use faultline::prelude::*;
use serde_json::json;

fn frame(file: &str, line: u32, function: &str) -> RawFrame {
    RawFrame::at(file, line, function)
}

fn scope(stacks: Vec<Vec<RawFrame>>) -> Scope {
    Scope::new(Config::new())
        .with_source(Rc::new(ScriptedSource::new(stacks)))
        .with_reporter(Rc::new(NullReporter))
}

fn fault_at(trace: Vec<RawFrame>) -> Fault {
    Fault::with_trace(io::Error::other("boom"), trace)
}

/// Collects every summary text present in a built context, in frame order.
fn summaries(context: &DiagnosticContext) -> Vec<String> {
    context
        .meta()
        .iter()
        .filter_map(|record| match record.payload() {
            MetaPayload::Summary(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_summary_recorded_mid_work_appears_on_its_frame() {
    // captures: catcher boundary at main.rs:1, then the summary from inside
    // worker.rs:20
    let scope = scope(vec![
        vec![frame("main.rs", 1, "main")],
        vec![frame("worker.rs", 20, "work"), frame("main.rs", 1, "main")],
    ]);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let scope_ref = &scope;

    Catcher::prime(&scope, move || {
        scope_ref.summary("crunching the batch");
        Err::<(), _>(fault_at(vec![
            frame("deep.rs", 99, "deep"),
            frame("worker.rs", 20, "work"),
            frame("main.rs", 1, "main"),
        ]))
    })
    .catch_all()
    .callback(move |event| {
        let context = event.context().read();
        sink.borrow_mut().extend(summaries(&context));

        // the summary sits on the worker frame, not the boundary frame
        let stack = context.call_stack();
        assert!(stack[0].meta().iter().all(|r| !matches!(
            r.payload(),
            MetaPayload::Summary(_)
        )));
        assert!(stack[1]
            .meta()
            .iter()
            .any(|r| matches!(r.payload(), MetaPayload::Summary(_))));
        Verdict::Continue
    })
    .execute()
    .unwrap();

    assert_eq!(seen.borrow().as_slice(), ["crunching the batch".to_string()]);
}

#[test]
fn test_sibling_branch_does_not_inherit_metadata() {
    // first branch records a summary at depth 1 (a.rs), then returns; the
    // failing branch (b.rs) at the same depth must not see it
    let scope = scope(vec![
        // the summary is captured from inside branch a, before the catcher
        // boundary is pushed back at main
        vec![frame("a.rs", 10, "branch_a"), frame("main.rs", 1, "main")],
        vec![frame("main.rs", 1, "main")],
    ]);

    scope.summary("inside branch a");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();

    Catcher::prime(&scope, || {
        Err::<(), _>(fault_at(vec![
            frame("b.rs", 20, "branch_b"),
            frame("main.rs", 1, "main"),
        ]))
    })
    .catch_all()
    .callback(move |event| {
        sink.borrow_mut().extend(summaries(&event.context().read()));
        Verdict::Continue
    })
    .execute()
    .unwrap();

    assert!(seen.borrow().is_empty());
}

#[test]
fn test_loop_re_annotation_keeps_one_record() {
    let loop_stack = vec![frame("worker.rs", 33, "work"), frame("main.rs", 1, "main")];
    let scope = scope(vec![
        vec![frame("main.rs", 1, "main")],
        loop_stack.clone(),
        loop_stack.clone(),
        loop_stack.clone(),
    ]);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let scope_ref = &scope;

    Catcher::prime(&scope, move || {
        for item in 0..3 {
            scope_ref.context(json!({ "item": item }));
        }
        Err::<(), _>(fault_at(vec![
            frame("worker.rs", 33, "work"),
            frame("main.rs", 1, "main"),
        ]))
    })
    .catch_all()
    .callback(move |event| {
        let context = event.context().read();
        let data: Vec<_> = context
            .meta()
            .iter()
            .filter_map(|record| match record.payload() {
                MetaPayload::Context(map) => Some(map.clone()),
                _ => None,
            })
            .collect();
        sink.borrow_mut().extend(data);
        Verdict::Continue
    })
    .execute()
    .unwrap();

    // one record, holding the final iteration's data
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].get("item"), Some(&json!(2)));
}

#[test]
fn test_boundary_marker_carries_resolved_known_tags() {
    let scope = scope(vec![vec![frame("main.rs", 1, "main")]]);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();

    Catcher::prime(&scope, || {
        Err::<(), _>(fault_at(vec![
            frame("deep.rs", 9, "deep"),
            frame("main.rs", 1, "main"),
        ]))
    })
    .catch_all()
    .known("OPS-42")
    .callback(move |event| {
        let context = event.context().read();
        let stack = context.call_stack();
        let caught = stack.exception_caught_frame().unwrap();
        for record in caught.meta() {
            if let Some(tags) = record.known_tags() {
                sink.borrow_mut().extend(tags.to_vec());
            }
        }
        assert_eq!(context.known(), ["OPS-42".to_string()]);
        Verdict::Continue
    })
    .execute()
    .unwrap();

    assert_eq!(seen.borrow().as_slice(), ["OPS-42".to_string()]);
}

#[test]
fn test_markers_land_on_the_expected_frames() {
    let config = Config::new().with_project_root("/project");
    let scope = Scope::new(config)
        .with_source(Rc::new(ScriptedSource::new(vec![vec![frame(
            "/project/src/main.rs",
            1,
            "main",
        )]])))
        .with_reporter(Rc::new(NullReporter));

    Catcher::prime(&scope, || {
        Err::<(), _>(fault_at(vec![
            frame("/project/vendor/lib/src/parse.rs", 88, "parse"),
            frame("/project/src/import.rs", 14, "import"),
            frame("/project/src/main.rs", 1, "main"),
        ]))
    })
    .catch_all()
    .callback(|event| {
        let context = event.context().read();
        let stack = context.call_stack();

        assert_eq!(stack.exception_caught_frame_index(), Some(0));
        assert_eq!(stack.last_application_frame_index(), Some(1));
        assert_eq!(stack.exception_thrown_frame_index(), Some(2));
        assert!(!stack[2].is_application_frame());

        // trace order flips the indices
        let trace = context.trace();
        assert_eq!(trace.exception_thrown_frame_index(), Some(0));
        Verdict::Continue
    })
    .execute()
    .unwrap();
}

#[test]
fn test_disabled_scope_builds_bare_frames() {
    let scope = Scope::new(Config::new().disabled())
        .with_source(Rc::new(ScriptedSource::new(vec![vec![frame(
            "main.rs", 1, "main",
        )]])))
        .with_reporter(Rc::new(NullReporter));

    scope.summary("never stored");

    Catcher::prime(&scope, || {
        Err::<(), _>(fault_at(vec![
            frame("deep.rs", 9, "deep"),
            frame("main.rs", 1, "main"),
        ]))
    })
    .catch_all()
    .callback(|event| {
        let context = event.context().read();
        assert!(context.meta().is_empty());
        assert!(context.known().is_empty());

        let stack = context.call_stack();
        assert_eq!(stack.len(), 2);
        assert!(stack.exception_thrown_frame().is_none());
        assert!(stack.last_application_frame().is_none());
        assert!(stack.exception_caught_frame().is_none());
        Verdict::Continue
    })
    .execute()
    .unwrap();
}

#[test]
fn test_double_reverse_round_trip() {
    let scope = scope(vec![vec![frame("main.rs", 1, "main")]]);

    Catcher::prime(&scope, || {
        Err::<(), _>(fault_at(vec![
            frame("deep.rs", 9, "deep"),
            frame("mid.rs", 5, "mid"),
            frame("main.rs", 1, "main"),
        ]))
    })
    .catch_all()
    .callback(|event| {
        let context = event.context().read();
        let original = context.call_stack();

        let mut round_trip = context.call_stack();
        round_trip.reverse();
        round_trip.reverse();

        let before: Vec<_> = original.iter().map(|f| f.position().clone()).collect();
        let after: Vec<_> = round_trip.iter().map(|f| f.position().clone()).collect();
        assert_eq!(before, after);
        Verdict::Continue
    })
    .execute()
    .unwrap();
}

//! End-to-end walkthroughs of the execution model

mod common;

use common::{assert_eq, recording_runtime, recording_runtime_with, stack_with, trace_of};
use rstest::rstest;
use stacksim_runtime::scenarios::{
    dispatch_click, event_listener_chain, install_global_error_handler, load_page,
    timer_ordering, traverse, UserData, TRAVERSE_FRAME,
};
use stacksim_runtime::{
    ConsoleLevel, ElementNode, RuntimeError, StackError, StackSimulator, ThrownKind, TickMode,
    DEFAULT_MAX_DEPTH, MAIN_FRAME,
};
use std::time::Duration;

// ============================================================================
// Call chains and traces
// ============================================================================

#[test]
fn test_click_chain_trace() {
    let stack = stack_with(&["handleClick", "fetchUserData", "formatData"]);
    assert_eq!(
        trace_of(&stack),
        vec!["formatData", "fetchUserData", "handleClick"]
    );
    // Asking twice without push/pop gives the same answer.
    assert_eq!(trace_of(&stack), trace_of(&stack));
}

#[test]
fn test_event_listener_chain_success() {
    let (mut rt, console) = recording_runtime();
    let user = UserData::new("Alice", 30).with_email("alice@example.com");

    let formatted = event_listener_chain(&mut rt, &user).unwrap();

    assert_eq!(formatted, "Alice (alice@example.com)");
    assert!(rt.stack().is_empty());
    assert_eq!(console.messages()[0], "Button clicked");
}

#[test]
fn test_event_listener_chain_missing_email() {
    let (mut rt, console) = recording_runtime();
    let user = UserData::new("Alice", 30);

    let err = event_listener_chain(&mut rt, &user).unwrap_err();

    match &err {
        RuntimeError::Thrown { kind, message, .. } => {
            assert_eq!(*kind, ThrownKind::Error);
            assert_eq!(message, "Email is missing in user data!");
        }
        other => panic!("expected thrown error, got {:?}", other),
    }
    assert_eq!(
        err.trace().frames(),
        ["formatData", "fetchUserData", "handleClick"]
    );
    assert!(rt.stack().is_empty(), "frames must unwind after the throw");

    insta::assert_snapshot!(console.transcript(), @r"
    log: Button clicked
    log: User data fetched: { name: 'Alice', age: 30 }
    ");
}

#[test]
fn test_click_reaches_global_error_handler() {
    let (mut rt, console) = recording_runtime();
    install_global_error_handler(&mut rt);

    let report = dispatch_click(&mut rt, &UserData::new("Alice", 30));

    let error = report.error.expect("click should fail");
    assert_eq!(
        error.trace().frames(),
        ["formatData", "fetchUserData", "handleClick", MAIN_FRAME]
    );

    let entries = console.entries();
    let last = entries.last().unwrap();
    assert_eq!(last.level, ConsoleLevel::Error);
    assert_eq!(
        last.message,
        "Global Error Handler: Error: Email is missing in user data!\n    at formatData\n    at fetchUserData\n    at handleClick\n    at <main>"
    );
}

#[test]
fn test_default_uncaught_handler() {
    let (mut rt, console) = recording_runtime();

    let report = rt.run_script(|rt| load_page(rt, None).map(|_| ()));

    assert!(report.error.is_some());
    assert_eq!(
        console.messages(),
        vec![
            "Uncaught TypeError: Cannot read properties of undefined (reading 'name')\n    at processData\n    at fetchData\n    at loadPage\n    at <main>"
        ]
    );
}

#[test]
fn test_load_page_type_error_report() {
    let (mut rt, _) = recording_runtime();

    let err = load_page(&mut rt, None).unwrap_err();

    assert_eq!(
        err.report(),
        "TypeError: Cannot read properties of undefined (reading 'name')\n    at processData\n    at fetchData\n    at loadPage"
    );
    assert_eq!(err.trace().top(), Some("processData"));
    insta::assert_json_snapshot!(err.trace(), @r#"
    [
      "processData",
      "fetchData",
      "loadPage"
    ]
    "#);
}

#[test]
fn test_load_page_with_data() {
    let (mut rt, console) = recording_runtime();
    let user = UserData::new("Bob", 41);

    assert_eq!(load_page(&mut rt, Some(&user)).unwrap(), "Bob");
    assert_eq!(console.messages(), vec!["Bob"]);
}

// ============================================================================
// Recursion and overflow
// ============================================================================

#[rstest]
#[case::tiny(1)]
#[case::small(16)]
#[case::default_limit(DEFAULT_MAX_DEPTH)]
fn test_recursion_past_limit_overflows(#[case] max_depth: usize) {
    let mut stack = StackSimulator::with_max_depth(max_depth);
    for _ in 0..max_depth {
        stack.push("recurse").unwrap();
    }
    assert_eq!(stack.depth(), max_depth);

    let err = stack.push("recurse").unwrap_err();
    assert_eq!(
        err,
        StackError::Overflow {
            name: "recurse".to_string(),
            max_depth
        }
    );
    assert_eq!(stack.depth(), max_depth);
}

#[test]
fn test_recursion_unwinds_symmetrically() {
    let mut stack = StackSimulator::new();
    let mut depths = Vec::new();
    for i in 0..5 {
        stack.push(format!("factorial({})", 5 - i)).unwrap();
        depths.push(stack.depth());
    }
    while stack.pop().is_ok() {
        depths.push(stack.depth());
    }
    assert_eq!(depths, vec![1, 2, 3, 4, 5, 4, 3, 2, 1, 0]);
    assert_eq!(stack.pop(), Err(StackError::Empty));
}

#[test]
fn test_traverse_visits_preorder() {
    let (mut rt, console) = recording_runtime();
    let body = ElementNode::new("BODY")
        .with_child(
            ElementNode::new("HEADER").with_child(ElementNode::new("H1")),
        )
        .with_child(
            ElementNode::new("MAIN")
                .with_child(ElementNode::new("P"))
                .with_child(ElementNode::new("UL").with_child(ElementNode::new("LI"))),
        );

    let visited = traverse(&mut rt, &body).unwrap();

    assert_eq!(visited, vec!["BODY", "HEADER", "H1", "MAIN", "P", "UL", "LI"]);
    assert_eq!(console.messages(), visited);
    assert!(rt.stack().is_empty());
}

#[rstest]
#[case::fits(8, 8, true)]
#[case::one_too_deep(8, 9, false)]
#[case::default_limit_plus_one(DEFAULT_MAX_DEPTH, DEFAULT_MAX_DEPTH + 1, false)]
fn test_traverse_depth_limit(#[case] max_depth: usize, #[case] tree_depth: usize, #[case] ok: bool) {
    let (mut rt, _) = recording_runtime_with(max_depth, TickMode::Single);

    let result = traverse(&mut rt, &ElementNode::nested(tree_depth));

    assert_eq!(result.is_ok(), ok);
    if let Err(err) = result {
        assert!(err.is_overflow());
        assert_eq!(err.trace().len(), max_depth);
        assert!(err.trace().iter().all(|name| name == TRAVERSE_FRAME));
    }
    assert!(rt.stack().is_empty());
}

// ============================================================================
// Deferred tasks
// ============================================================================

#[rstest]
#[case::zero(Duration::ZERO)]
#[case::one_ms(Duration::from_millis(1))]
#[case::one_second(Duration::from_secs(1))]
fn test_timer_runs_after_synchronous_code(#[case] delay: Duration) {
    let (mut rt, console) = recording_runtime();

    let report = timer_ordering(&mut rt, delay);

    assert_eq!(report.error, None);
    assert_eq!(report.tasks.ran, 1);
    assert_eq!(console.transcript(), "log: A\nlog: C\nlog: B");
}

#[rstest]
#[case::single(TickMode::Single)]
#[case::batch(TickMode::Batch)]
fn test_timers_keep_arrival_order(#[case] mode: TickMode) {
    let (mut rt, console) = recording_runtime_with(DEFAULT_MAX_DEPTH, mode);

    rt.run_script(|rt| {
        rt.set_timeout(Duration::from_millis(100), |rt| {
            rt.log("slow timer");
            Ok(())
        });
        rt.set_timeout(Duration::ZERO, |rt| {
            rt.log("fast timer");
            Ok(())
        });
        rt.log("sync");
        Ok(())
    });

    assert_eq!(console.messages(), vec!["sync", "slow timer", "fast timer"]);
}

#[test]
fn test_cancelled_timer_never_runs() {
    let (mut rt, console) = recording_runtime();

    rt.run_script(|rt| {
        let id = rt.set_timeout(Duration::ZERO, |rt| {
            rt.log("cancelled");
            Ok(())
        });
        assert!(rt.cancel(id));
        rt.log("sync");
        Ok(())
    });

    assert_eq!(console.messages(), vec!["sync"]);
}

#[test]
fn test_failing_task_does_not_block_queue() {
    let (mut rt, console) = recording_runtime();
    let failures = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&failures);
    rt.scheduler_mut()
        .set_error_observer(move |err| sink.borrow_mut().push(err.id));

    let report = rt.run_script(|rt| {
        rt.defer(|rt| rt.call("broken", |rt| Err(rt.throw(ThrownKind::Error, "task failed"))));
        rt.defer(|rt| {
            rt.log("survivor");
            Ok(())
        });
        Ok(())
    });

    assert_eq!(report.tasks.ran, 2);
    assert_eq!(report.tasks.failed, 1);
    assert_eq!(failures.borrow().len(), 1);
    assert_eq!(console.messages().last().map(String::as_str), Some("survivor"));
}

#[test]
fn test_task_observes_empty_stack() {
    let (mut rt, _) = recording_runtime();
    let depths = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&depths);

    rt.run_script(move |rt| {
        rt.call("outer", |rt| {
            rt.defer(move |rt| {
                sink.borrow_mut().push(rt.stack().depth());
                Ok(())
            });
            Ok(())
        })
    });

    assert_eq!(*depths.borrow(), vec![0]);
}

#[test]
fn test_click_inside_timer_does_not_run_later_tasks() {
    let (mut rt, console) = recording_runtime();
    install_global_error_handler(&mut rt);

    rt.run_script(|rt| {
        rt.set_timeout(Duration::ZERO, |rt| {
            rt.log("timer start");
            let report = dispatch_click(rt, &UserData::new("Alice", 30));
            assert!(report.error.is_some());
            assert!(report.tasks.is_empty());
            rt.log("timer end");
            Ok(())
        });
        rt.set_timeout(Duration::ZERO, |rt| {
            rt.log("next task");
            Ok(())
        });
        Ok(())
    });

    let messages = console.messages();
    let position = |needle: &str| messages.iter().position(|m| m == needle).unwrap();
    assert_eq!(messages.first().map(String::as_str), Some("timer start"));
    assert!(position("timer end") < position("next task"));
    assert_eq!(messages.last().map(String::as_str), Some("next task"));
}

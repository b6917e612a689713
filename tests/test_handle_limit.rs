//! Runs alone in its own binary: the limit applies to the whole process.

mod common;

use common::{last_code, last_error, release, setup, string};
use idlbridge::runtime::{configure, handles, ErrorCode, RuntimeOptions};
use idlbridge::taskmanager::bindings::*;

#[test]
fn test_live_handle_limit() {
    setup();
    let headroom = 4;
    configure(RuntimeOptions {
        max_live_handles: handles().live() + headroom,
        trace_calls: false,
    });

    let tasks: Vec<_> = (0..headroom).map(|_| ITask_Create()).collect();
    assert!(tasks.iter().all(|h| !h.is_null()), "{}", last_error());

    assert!(ITask_Create().is_null());
    assert_eq!(last_code(), ErrorCode::HandleLimit as i32);
    assert!(last_error().starts_with("HandleLimit"));

    // Results that need a handle fail the same way
    assert!(ITask_Getid(tasks[0]).is_null());
    assert_eq!(last_code(), ErrorCode::HandleLimit as i32);
    // Scalars do not
    assert_eq!(ITask_Getpriority(tasks[0]), 1);
    assert_eq!(last_code(), 0);

    assert!(ITask_Release(tasks[0]));
    let replacement = ITask_Create();
    assert!(!replacement.is_null(), "{}", last_error());

    configure(RuntimeOptions::default());
    let text = string("unlimited again");
    release(text);

    assert!(ITask_Release(replacement));
    for task in &tasks[1..] {
        assert!(ITask_Release(*task));
    }
}

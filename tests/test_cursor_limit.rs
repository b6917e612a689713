//! Runs alone in its own binary: the limit applies to the whole process.

mod common;

use common::{last_code, release, string, take_string};
use idlbridge::runtime::ffi::{
    idlbridge_dict_insert, idlbridge_dict_new, idlbridge_dict_next, idlbridge_dict_release,
    idlbridge_set_insert, idlbridge_set_new, idlbridge_set_next, idlbridge_set_release,
};
use idlbridge::runtime::{configure, handles, ErrorCode, RuntimeOptions, TypedValue};

fn limit_to(max_live_handles: usize) {
    configure(RuntimeOptions {
        max_live_handles,
        trace_calls: false,
    });
}

#[test]
fn test_cursor_survives_failed_step() {
    let dict = idlbridge_dict_new();
    let key = string("owner");
    let value = string("sam");
    assert!(idlbridge_dict_insert(dict, TypedValue::handle(key), TypedValue::handle(value)));
    release(key);
    release(value);

    let set = idlbridge_set_new();
    let tag = string("weekend");
    assert!(idlbridge_set_insert(set, TypedValue::handle(tag)));
    release(tag);

    // Room for the key but not the value
    let live = handles().live();
    limit_to(live + 1);
    let mut key_out = TypedValue::void();
    let mut value_out = TypedValue::void();
    assert!(!idlbridge_dict_next(dict, &mut key_out, &mut value_out));
    assert_eq!(last_code(), ErrorCode::HandleLimit as i32);
    assert_eq!(handles().live(), live, "key handle was not given back");

    limit_to(live);
    let mut item = TypedValue::void();
    assert!(!idlbridge_set_next(set, &mut item));
    assert_eq!(last_code(), ErrorCode::HandleLimit as i32);
    assert_eq!(handles().live(), live);

    // The same entries come back once handles are available
    configure(RuntimeOptions::default());
    assert!(idlbridge_dict_next(dict, &mut key_out, &mut value_out));
    assert_eq!(take_string(key_out.as_handle().unwrap()), "owner");
    assert_eq!(take_string(value_out.as_handle().unwrap()), "sam");
    assert!(!idlbridge_dict_next(dict, &mut key_out, &mut value_out));
    assert_eq!(last_code(), 0);

    assert!(idlbridge_set_next(set, &mut item));
    assert_eq!(take_string(item.as_handle().unwrap()), "weekend");
    assert!(!idlbridge_set_next(set, &mut item));

    assert!(idlbridge_dict_release(dict));
    assert!(idlbridge_set_release(set));
    assert_eq!(handles().live(), live - 2);
}

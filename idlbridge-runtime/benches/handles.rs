use criterion::{black_box, criterion_group, criterion_main, Criterion};
use idlbridge_runtime::handle::{handles, HandleTable};
use idlbridge_runtime::string::{new_string_handle, new_string_object};
use idlbridge_runtime::{TypeTag, TypedValue};

fn bench_handle_table(c: &mut Criterion) {
    let table = HandleTable::new();

    c.bench_function("issue_release", |b| {
        b.iter(|| {
            let handle = table.issue(new_string_object("bench").unwrap()).unwrap();
            black_box(table.release(handle, Some(TypeTag::String)).unwrap());
        });
    });

    let handle = table.issue(new_string_object("bench").unwrap()).unwrap();
    c.bench_function("resolve", |b| {
        b.iter(|| black_box(table.resolve(black_box(handle), Some(TypeTag::String)).unwrap()));
    });
    table.release(handle, None).unwrap();
}

fn bench_boundary(c: &mut Criterion) {
    let string = new_string_handle("bench").unwrap();

    c.bench_function("string_length", |b| {
        b.iter(|| black_box(idlbridge_runtime::ffi::idlbridge_string_length(black_box(string))));
    });

    let array = idlbridge_runtime::ffi::idlbridge_array_new();
    for i in 0..64 {
        idlbridge_runtime::ffi::idlbridge_array_push(array, TypedValue::i32(i));
    }
    c.bench_function("array_item", |b| {
        let mut out = TypedValue::void();
        b.iter(|| {
            idlbridge_runtime::ffi::idlbridge_array_item(array, black_box(17), &mut out);
            black_box(out.as_i32())
        });
    });

    handles().release(array, None).unwrap();
    handles().release(string, None).unwrap();
}

criterion_group!(benches, bench_handle_table, bench_boundary);
criterion_main!(benches);

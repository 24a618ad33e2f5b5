use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lrc_engine::diff::{diff, utf16_units};
use lrc_engine::encode::encode_batch;

fn bench_single_keystroke(c: &mut Criterion) {
    // The common case: one character appended to a chat-length draft.
    let old = utf16_units("the quick brown fox jumps over the lazy do");
    let new = utf16_units("the quick brown fox jumps over the lazy dog");

    c.bench_function("diff_single_keystroke", |b| {
        b.iter(|| black_box(diff(black_box(&old), black_box(&new))))
    });
}

fn bench_mid_edit(c: &mut Criterion) {
    let old = utf16_units("I accidentally typed teh wrong word in the middle here");
    let new = utf16_units("I accidentally typed the wrong word in the middle here");

    c.bench_function("diff_mid_edit", |b| {
        b.iter(|| black_box(diff(black_box(&old), black_box(&new))))
    });
}

fn bench_full_rewrite(c: &mut Criterion) {
    // Worst case at chat scale: nothing in common.
    let old = utf16_units("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let new = utf16_units("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    c.bench_function("diff_full_rewrite_32", |b| {
        b.iter(|| black_box(diff(black_box(&old), black_box(&new))))
    });
}

fn bench_diff_and_encode(c: &mut Criterion) {
    let old = utf16_units("typing a mess");
    let new = utf16_units("typing a message");

    c.bench_function("diff_and_encode_batch", |b| {
        b.iter(|| {
            let script = diff(black_box(&old), black_box(&new));
            black_box(encode_batch(&script))
        })
    });
}

criterion_group!(
    benches,
    bench_single_keystroke,
    bench_mid_edit,
    bench_full_rewrite,
    bench_diff_and_encode
);
criterion_main!(benches);

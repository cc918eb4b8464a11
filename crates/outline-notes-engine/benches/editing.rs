use criterion::{Criterion, criterion_group, criterion_main};
use outline_notes_engine::Editor;
mod common;

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");
    group.sample_size(10);

    let content = common::generate_outline(100, 3);

    group.bench_function("type_and_split", |b| {
        let mut editor = Editor::new();
        editor.load(&content);
        editor.focus_line(50, 5);
        b.iter(|| {
            editor.insert_text(std::hint::black_box("word"));
            editor.split_line();
        });
    });

    group.bench_function("paste_multiline", |b| {
        b.iter(|| {
            let mut editor = Editor::new();
            editor.load(&content);
            editor.insert_text(std::hint::black_box("one\ntwo\nthree\nfour"));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_typing);
criterion_main!(benches);

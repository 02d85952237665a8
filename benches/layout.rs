//! Benchmarks for chapter layout and navigation.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lectern::book::{Book, Chapter};
use lectern::layout::{Viewport, paginate, wrap};
use lectern::navigation::Navigation;

fn sample_chapter(paragraphs: usize) -> String {
    let paragraph = "Call me Ishmael. Some years ago, never mind how long precisely, having \
                     little or no money in my purse, and nothing particular to interest me on \
                     shore, I thought I would sail about a little and see the watery part of \
                     the world.";
    vec![paragraph; paragraphs].join("\n\n")
}

fn bench_wrap_paragraph(c: &mut Criterion) {
    let text = sample_chapter(1);
    c.bench_function("wrap_paragraph", |b| {
        b.iter(|| wrap(black_box(&text), black_box(72)))
    });
}

fn bench_paginate_chapter(c: &mut Criterion) {
    let text = sample_chapter(200);
    let viewport = Viewport::new(76, 22);
    c.bench_function("paginate_chapter", |b| {
        b.iter(|| paginate(black_box(&text), black_box(viewport)))
    });
}

fn bench_resize_relayout(c: &mut Criterion) {
    let chapters = (0..20)
        .map(|i| Chapter::from_text(format!("Chapter {i}"), &sample_chapter(50)))
        .collect();
    let book = Arc::new(Book::new(None, None, chapters).unwrap());
    c.bench_function("resize_relayout", |b| {
        b.iter(|| {
            let mut nav = Navigation::new(Arc::clone(&book), Viewport::new(76, 22));
            nav.next_page();
            nav.on_resize(black_box(Viewport::new(50, 30)));
            nav.on_resize(black_box(Viewport::new(120, 40)));
            nav.cursor()
        })
    });
}

criterion_group!(
    benches,
    bench_wrap_paragraph,
    bench_paginate_chapter,
    bench_resize_relayout
);
criterion_main!(benches);

//! Performance benchmarks for span alignment and tag extraction.
//!
//! # Usage
//!
//! ```bash
//! cargo bench --bench alignment
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagalign::{align_entity, extract_spans, spans_to_iob2, TokenMask};

const GENIA_TYPES: [&str; 5] = ["protein", "DNA", "RNA", "cell_type", "cell_line"];

const BENCH_SENTENCE: &str = "IL-2 gene expression and NF-kappa B activation through CD28 \
     requires reactive oxygen production by 5-lipoxygenase in primary T lymphocytes \
     and activated natural killer cells from peripheral blood .";

const BENCH_OUTPUT: &str = "<output> <protein>IL-2</protein> gene expression and \
     <protein>NF-kappa B</protein> activation through <protein>CD28</protein> requires \
     reactive oxygen production by <protein>5-lipoxygenase</protein> in primary \
     <cell_type>T lymphocytes</cell_type> and activated \
     <cell_type>natural killer cells</cell_type> from peripheral blood . </output>";

fn bench_align_entity(c: &mut Criterion) {
    let tokens: Vec<&str> = BENCH_SENTENCE.split_whitespace().collect();
    let mask = TokenMask::new(tokens.len());
    let entity = ["natural", "killer", "cells"];

    c.bench_function("align_entity", |b| {
        b.iter(|| align_entity(black_box(&entity), black_box(&tokens), black_box(&mask)))
    });
}

fn bench_extract_spans(c: &mut Criterion) {
    let tokens: Vec<&str> = BENCH_SENTENCE.split_whitespace().collect();

    c.bench_function("extract_spans", |b| {
        b.iter(|| extract_spans(black_box(BENCH_OUTPUT), &GENIA_TYPES, black_box(&tokens)))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let tokens: Vec<&str> = BENCH_SENTENCE.split_whitespace().collect();

    c.bench_function("extract_spans_to_iob2", |b| {
        b.iter(|| {
            let (_, spans) = extract_spans(black_box(BENCH_OUTPUT), &GENIA_TYPES, &tokens);
            spans_to_iob2(&spans, tokens.len())
        })
    });
}

criterion_group!(benches, bench_align_entity, bench_extract_spans, bench_full_pipeline);
criterion_main!(benches);

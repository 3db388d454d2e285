//! This bench test measures building the reference data and rendering every
//! text artifact from it.

#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use reliability::{
    Dataset, FaultTree, OutlineStyle, Report, ReportOptions,
    render::{DotOptions, csv, outline_text, to_dot},
};

fn build_reference(c: &mut Criterion) {
    c.bench_function("build reference dataset", |b| {
        b.iter(Dataset::reference);
    });
}

fn render_artifacts(c: &mut Criterion) {
    let dataset = Dataset::reference();

    c.bench_function("render outline", |b| {
        b.iter(|| outline_text(dataset.tree(), OutlineStyle::Connectors));
    });
    c.bench_function("render fmea csv", |b| {
        b.iter(|| csv(dataset.fmea()));
    });
    c.bench_function("render dot", |b| {
        b.iter(|| to_dot(dataset.tree(), &DotOptions::default()));
    });
    c.bench_function("assemble report", |b| {
        b.iter(|| Report::assemble(&dataset, ReportOptions::default()).render());
    });
}

fn rebuild_from_edges(c: &mut Criterion) {
    let edges = FaultTree::reference().edges();

    c.bench_function("rebuild tree from edges", |b| {
        b.iter(|| FaultTree::from_edges("Cooling system failure", &edges).unwrap());
    });
}

criterion_group!(benches, build_reference, render_artifacts, rebuild_from_edges);
criterion_main!(benches);

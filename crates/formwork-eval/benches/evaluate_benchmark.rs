//! Evaluator benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use formwork_core::{CollectedNotices, ResolvedFields, Value};
use formwork_eval::ExpressionEvaluator;
use formwork_parser::{parse, split_template};
use formwork_store::MemoryStore;
use futures::executor::block_on;
use serde_json::json;

const SIMPLE: &str = "{{1 + 2 * 3}}";

const MEDIUM: &str = "Total: {{[$$.field-a, $$.field-b, 4.5]\
    .map(n => Number(n) * 2)\
    .filter(n => n > 1)\
    .join(' + ')}} EUR";

const DOCUMENT: &str = "{{Object.values(%%expenses/groceries.md%%).join(', ')}}";

fn fields() -> ResolvedFields {
    [("field-a", Value::from("12")), ("field-b", Value::Number(3.0))]
        .into_iter()
        .collect()
}

fn parse_medium(c: &mut Criterion) {
    let body = split_template(MEDIUM).body.replace("$$.field-a", "'12'").replace("$$.field-b", "3");
    c.bench_function("parse_medium", |b| b.iter(|| parse(black_box(&body))));
}

fn evaluate_simple(c: &mut Criterion) {
    let store = MemoryStore::new();
    let notices = CollectedNotices::new();
    let evaluator = ExpressionEvaluator::new(&store, &notices);
    let fields = ResolvedFields::new();
    c.bench_function("evaluate_simple", |b| {
        b.iter(|| block_on(evaluator.evaluate(black_box(SIMPLE), &fields)))
    });
}

fn evaluate_medium(c: &mut Criterion) {
    let store = MemoryStore::new();
    let notices = CollectedNotices::new();
    let evaluator = ExpressionEvaluator::new(&store, &notices);
    let fields = fields();
    c.bench_function("evaluate_medium", |b| {
        b.iter(|| block_on(evaluator.evaluate(black_box(MEDIUM), &fields)))
    });
}

fn evaluate_document(c: &mut Criterion) {
    let store = MemoryStore::new().with_document(
        "expenses/groceries.md",
        json!({"category": "food", "amount": 12}),
    );
    let notices = CollectedNotices::new();
    let evaluator = ExpressionEvaluator::new(&store, &notices);
    let fields = ResolvedFields::new();
    c.bench_function("evaluate_document", |b| {
        b.iter(|| block_on(evaluator.evaluate(black_box(DOCUMENT), &fields)))
    });
}

criterion_group!(
    benches,
    parse_medium,
    evaluate_simple,
    evaluate_medium,
    evaluate_document
);
criterion_main!(benches);

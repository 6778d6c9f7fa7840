use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use mask_core::{extract_str, Context, Element, Node, TemplateEngine};
use serde_json::json;

fn sample_tree(rows: usize) -> Node {
    let mut table = Element::new("table");
    for i in 0..rows {
        table = table.with_child(
            Element::new("tr")
                .with_attribute("data-row", format!("{i}"))
                .with_attribute("title", "{{user.name | mask}}")
                .with_child(Element::new("td").with_text("{{user.phone | mask}}"))
                .with_child(Element::new("td").with_text("static cell")),
        );
    }
    table.into()
}

fn bench_scan(c: &mut Criterion) {
    let ctx = Context::try_from(json!({
        "user": {
            "name": "_mask|GM|bm9uY2U|ZW5j|bWFj|B*b",
            "phone": "_mask|GM|bm9uY2U|ZW5j|bWFj|138****5678"
        }
    }))
    .unwrap();
    let engine = TemplateEngine::new(ctx);
    let tree = sample_tree(500);

    c.bench_function("scan_500_rows", |b| {
        b.iter(|| {
            let mut t = tree.clone();
            engine.scan_now(black_box(&mut t))
        })
    });

    c.bench_function("extract_token", |b| {
        b.iter(|| extract_str(black_box("_mask|MODERN|bm9uY2U|ZW5jcnlwdA==|bWFj|138****5678")))
    });
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);

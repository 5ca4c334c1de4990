use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use yang_json::order::{ChildQuery, find, linear_match};
use yang_json::{CodecSettings, Schema, parse_str};

fn bench_search(c: &mut Criterion) {
    let schema: Schema = include_str!("../samples/example-schema.json")
        .parse()
        .expect("example schema");
    let mut group = c.benchmark_group("user_lookup");
    for count in [16usize, 256, 4096] {
        let users: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"first": "u{i:05}", "last": "x", "uid": {i}}}"#))
            .collect();
        let text = format!(r#"{{"example:user": [{}]}}"#, users.join(","));
        let parsed = parse_str(&text, Some(&schema), &CodecSettings::new()).expect("valid users");
        let tree = parsed.tree;
        let root = tree.root();
        let user = tree.schema(parsed.top[0]).expect("bound");
        let wanted = format!("u{:05}", count * 3 / 4);
        let q = ChildQuery::list("user", user, vec![("first", wanted.as_str()), ("last", "x")]);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("binary", count), &q, |b, q| {
            b.iter(|| find(black_box(&tree), &schema, root, q))
        });
        group.bench_with_input(BenchmarkId::new("linear", count), &q, |b, q| {
            b.iter(|| linear_match(black_box(&tree), &schema, root, q))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);

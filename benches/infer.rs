use criterion::{black_box, criterion_group, criterion_main, Criterion};
use filtermerge::{Field, InferenceEngine, MergeLevel, Rule};

/// `n` senders, each with a label pair and a two-level hierarchy.
fn build_rules(n: usize) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(n * 4);
    for i in 0..n {
        let sender = format!("team{i}@example.com");
        let base = i * 4;
        rules.push(Rule::builder(base).when(Field::From, sender.as_str()).label("Team").build());
        rules.push(
            Rule::builder(base + 1)
                .when(Field::From, sender.as_str())
                .label("Team2")
                .build(),
        );
        rules.push(
            Rule::builder(base + 2)
                .when(Field::To, sender.as_str())
                .label("Sent")
                .build(),
        );
        rules.push(
            Rule::builder(base + 3)
                .when(Field::To, sender.as_str())
                .when(Field::Subject, "{review approved merged}")
                .label("Sent/Review")
                .build(),
        );
    }
    rules
}

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer");

    for &n in &[5, 25, 100] {
        let rules = build_rules(n);
        for level in [MergeLevel::Conservative, MergeLevel::Aggressive] {
            let engine = InferenceEngine::builder().level(level).build();
            group.bench_function(&format!("{}_rules_{level}", rules.len()), |b| {
                b.iter(|| engine.infer(black_box(rules.clone())).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_assess(c: &mut Criterion) {
    let rules = build_rules(25);
    let engine = InferenceEngine::builder()
        .level(MergeLevel::Aggressive)
        .build();
    let (groups, _) = engine.candidates(&rules);

    c.bench_function("assess_candidates", |b| {
        b.iter(|| {
            for group in &groups {
                black_box(engine.assess(black_box(group)));
            }
        });
    });
}

criterion_group!(benches, bench_infer, bench_assess);
criterion_main!(benches);

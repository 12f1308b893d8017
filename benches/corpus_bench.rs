//! Benchmarks for corpus construction and ensemble tagging.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use namesieve::anomaly::{
    DivergenceTagger, ExpectedScriptTagger, MissingScriptTagger, TaggerEnsemble, VoteRule,
};
use namesieve::normalize::{StripAndCommaPermute, TokenNormalizer};
use namesieve::{Corpus, Granularity, Name, ScriptAnalyzer};

const SURFACE_FORMS: [(&str, &str); 8] = [
    ("Обама, Барак", "Barack Obama"),
    ("Москва", "Moscow"),
    ("Пушкин, Александр Сергеевич", "Alexander Pushkin"),
    ("Нижний Новгород", "Nizhny Novgorod"),
    ("Чайковский, Пётр Ильич", "Pyotr Tchaikovsky"),
    ("Владивосток", "Vladivostok"),
    ("Gagarin", "Yuri Gagarin"),
    ("Санкт-Петербург (город)", "Saint Petersburg"),
];

fn synthetic_names(count: usize) -> Vec<Name> {
    (0..count)
        .map(|i| {
            let (text, english) = SURFACE_FORMS[i % SURFACE_FORMS.len()];
            Name::new(text, "ru").with_english(english)
        })
        .collect()
}

fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("script_histogram");
    let analyzer = ScriptAnalyzer::new();
    let text = "Чайковский, Пётр Ильич (композитор)";
    group.throughput(Throughput::Elements(text.chars().count() as u64));

    group.bench_function("block", |b| {
        b.iter(|| black_box(analyzer.histogram(black_box(text), Granularity::Block)));
    });

    group.bench_function("script", |b| {
        b.iter(|| black_box(analyzer.histogram(black_box(text), Granularity::Script)));
    });

    group.finish();
}

fn bench_normalizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_process");
    let normalizer = StripAndCommaPermute::new();

    for (label, text) in [
        ("plain", "Москва"),
        ("comma", "Обама, Барак"),
        ("comma_paren", "Пушкин, Александр Сергеевич (поэт)"),
    ] {
        group.bench_function(label, |b| {
            b.iter(|| black_box(normalizer.process(black_box(text))));
        });
    }

    group.finish();
}

fn bench_corpus_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("corpus_build");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        let names = synthetic_names(size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let corpus = Corpus::builder(names.clone(), "ru")
                    .with_normalizer(Arc::new(StripAndCommaPermute::new()))
                    .build()
                    .expect("corpus should build");
                black_box(corpus)
            });
        });
    }

    group.finish();
}

fn bench_ensemble_tagging(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble_tag_all");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        let corpus = Corpus::builder(synthetic_names(size), "ru")
            .build()
            .expect("corpus should build");

        let mut ensemble = TaggerEnsemble::new(VoteRule::Majority);
        ensemble.register(Arc::new(ExpectedScriptTagger::new(
            ScriptAnalyzer::new(),
            Granularity::Script,
            "Cyrillic",
        )));
        ensemble.register(Arc::new(MissingScriptTagger::new(
            ScriptAnalyzer::new(),
            Granularity::Script,
            "Cyrillic",
        )));
        ensemble.register(Arc::new(DivergenceTagger::new(
            ScriptAnalyzer::new(),
            Granularity::Block,
            corpus.prototype().clone(),
        )));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut names = corpus.names().to_vec();
                ensemble.tag_all(&mut names);
                black_box(names)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_histogram,
    bench_normalizer,
    bench_corpus_build,
    bench_ensemble_tagging,
);
criterion_main!(benches);

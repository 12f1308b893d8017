//! Ensemble tagging tests
//!
//! These tests run tagger ensembles over small corpora to verify:
//! - Script-based taggers separate interlopers from genuine names
//! - Injected noise is caught and the split accounting holds up
//! - CJK-family taggers stay gated to their languages
//! - Aggregation rules treat abstentions as non-votes

use std::sync::Arc;

use namesieve::anomaly::{
    CjkTagger, DivergenceTagger, ExpectedScriptTagger, KanaTagger, MissingScriptTagger,
    TaggerEnsemble, VoteRule,
};
use namesieve::{Corpus, Granularity, Name, ScriptAnalyzer};

fn russian_names() -> Vec<Name> {
    vec![
        Name::new("Москва", "ru").with_english("Moscow"),
        Name::new("Тверь", "ru").with_english("Tver"),
        Name::new("Калуга", "ru").with_english("Kaluga"),
        Name::new("Moscow", "ru").with_english("Moscow"),
    ]
}

fn script_ensemble(prototype_corpus: &Corpus) -> TaggerEnsemble {
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
        prototype_corpus.prototype().clone(),
    )));
    ensemble
}

// ============================================================================
// Test: Script Taggers over a Corpus
// ============================================================================

#[test]
fn test_majority_ensemble_flags_the_interloper() {
    let mut corpus = Corpus::builder(russian_names(), "ru")
        .build()
        .expect("build corpus");

    // The Latin row pollutes the corpus prototype, so the divergence
    // tagger alone runs hot; under majority voting the other two carry.
    let ensemble = script_ensemble(&corpus);
    assert_eq!(ensemble.tagger_count(), 3);
    ensemble.tag_all(corpus.names_mut());

    let (anomalous, clean) = corpus.split_by_anomaly(true);
    let flagged: Vec<&str> = anomalous.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(flagged, vec!["Moscow"]);
    assert_eq!(clean.len(), 3);
    assert!(clean.iter().all(|n| n.anomalous == Some(false)));
}

#[test]
fn test_tagging_leaves_text_and_statistics_intact() {
    let mut corpus = Corpus::builder(russian_names(), "ru")
        .build()
        .expect("build corpus");
    let stats_before = corpus.stats().clone();
    let texts_before: Vec<String> = corpus.names().iter().map(|n| n.text.clone()).collect();

    let ensemble = script_ensemble(&corpus);
    ensemble.tag_all(corpus.names_mut());
    corpus.rebuild_stats();

    let texts_after: Vec<String> = corpus.names().iter().map(|n| n.text.clone()).collect();
    assert_eq!(texts_before, texts_after);
    assert_eq!(&stats_before, corpus.stats());
}

// ============================================================================
// Test: Noise Injection Evaluation
// ============================================================================

#[test]
fn test_injected_noise_is_caught() {
    let mut corpus = Corpus::builder(
        vec![
            Name::new("Москва", "ru").with_english("Moscow"),
            Name::new("Тверь", "ru").with_english("Tver"),
            Name::new("Калуга", "ru").with_english("Kaluga"),
        ],
        "ru",
    )
    .build()
    .expect("build corpus");

    let donors = vec![
        Name::new("Helsinki", "fi").with_english("Helsinki"),
        Name::new("Turku", "fi").with_english("Turku"),
        Name::new("Tampere", "fi").with_english("Tampere"),
        Name::new("Oulu", "fi").with_english("Oulu"),
    ];

    let added = corpus.inject_noise(&donors, 0.5, 7);
    assert_eq!(added, 2, "half of three rounds up to two samples");
    assert_eq!(corpus.len(), 5);

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
    ensemble.tag_all(corpus.names_mut());

    let caught = corpus
        .names()
        .iter()
        .filter(|n| n.is_noise_sample && n.anomalous == Some(true))
        .count();
    assert_eq!(caught, added, "every noise sample should be flagged");

    // Noise stays out of the split unless explicitly asked for.
    let (without_noise, clean) = corpus.split_by_anomaly(false);
    assert!(without_noise.is_empty());
    assert_eq!(clean.len(), 3);

    let (with_noise, _) = corpus.split_by_anomaly(true);
    assert_eq!(with_noise.len(), added);
}

// ============================================================================
// Test: CJK-Family Gating
// ============================================================================

#[test]
fn test_kana_and_cjk_taggers_vote_only_in_family() {
    let mut names = vec![
        Name::new("さいたま市", "ja").with_english("Saitama"),
        Name::new("東京", "ja").with_english("Tokyo"),
        Name::new("Tokyo", "ja").with_english("Tokyo"),
        Name::new("Москва", "ru").with_english("Moscow"),
    ];

    let mut ensemble = TaggerEnsemble::new(VoteRule::Majority);
    ensemble.register(Arc::new(KanaTagger::new(ScriptAnalyzer::new())));
    ensemble.register(Arc::new(CjkTagger::new(ScriptAnalyzer::new())));
    ensemble.tag_all(&mut names);

    // Kana present and CJK present: clean.
    assert_eq!(names[0].anomalous, Some(false));
    // Pure kanji splits the vote, which is not a majority.
    assert_eq!(names[1].anomalous, Some(false));
    // Latin label under ja trips both taggers.
    assert_eq!(names[2].anomalous, Some(true));
    // Out-of-family rows get two abstentions and stay clean.
    assert_eq!(names[3].anomalous, Some(false));
}

// ============================================================================
// Test: Abstentions under the All Rule
// ============================================================================

#[test]
fn test_all_rule_ignores_abstaining_taggers() {
    let mut names = vec![
        Name::new("Moscow", "ru").with_english("Moscow"),
        Name::new("Москва", "ru").with_english("Moscow"),
    ];

    let mut ensemble = TaggerEnsemble::new(VoteRule::All);
    // The kana tagger abstains on ru, the script tagger votes.
    ensemble.register(Arc::new(KanaTagger::new(ScriptAnalyzer::new())));
    ensemble.register(Arc::new(ExpectedScriptTagger::new(
        ScriptAnalyzer::new(),
        Granularity::Script,
        "Cyrillic",
    )));
    ensemble.tag_all(&mut names);

    assert_eq!(names[0].anomalous, Some(true));
    assert_eq!(names[1].anomalous, Some(false));
}

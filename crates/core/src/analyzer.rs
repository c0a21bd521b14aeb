//! Heuristic scoring of a free-text answer against a question rubric.
//!
//! The score blends three sub-scores:
//!
//! | component | weight | source |
//! |-----------|--------|--------|
//! | keyword   | 0.4    | share of rubric keywords found in the answer |
//! | concept   | 0.4    | share of expected concepts found in the answer |
//! | length    | 0.2    | step function over the answer's word count |
//!
//! Matching is plain case-insensitive substring search. There is no
//! tokenization or stemming, so "dom" also matches inside "random".

use crate::model::{AnswerAnalysis, Question, ScoreBand};

const KEYWORD_WEIGHT: f64 = 0.4;
const CONCEPT_WEIGHT: f64 = 0.4;
const LENGTH_WEIGHT: f64 = 0.2;

//
// ─── SUB-SCORES ────────────────────────────────────────────────────────────────
//

/// Keywords from `keywords` that occur in `answer_lower`, in rubric order.
fn matched_keywords<'q>(answer_lower: &str, keywords: &'q [String]) -> Vec<&'q String> {
    keywords
        .iter()
        .filter(|keyword| answer_lower.contains(&keyword.to_lowercase()))
        .collect()
}

/// Concepts from `concepts` that the answer covers, in rubric order.
///
/// A concept counts when its full phrase appears, or when *any single word* of
/// the phrase appears. The word-level fallback is very permissive (a generic
/// word like "concept" or "process" is enough) and is likely a scoring-quality
/// problem, but it is what the product scores against today.
fn matched_concepts<'q>(answer_lower: &str, concepts: &'q [String]) -> Vec<&'q String> {
    concepts
        .iter()
        .filter(|concept| {
            let concept = concept.to_lowercase();
            answer_lower.contains(&concept)
                || concept
                    .split_whitespace()
                    .any(|word| answer_lower.contains(word))
        })
        .collect()
}

/// Percentage of `matched` over `total`. An empty rubric scores 0.
fn ratio_percent(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = matched as f64 / total as f64;
    ratio * 100.0
}

/// Keyword sub-score in 0..=100 for `answer`.
#[must_use]
pub fn keyword_score(answer: &str, question: &Question) -> f64 {
    let answer = answer.to_lowercase();
    let found = matched_keywords(&answer, question.keywords()).len();
    ratio_percent(found, question.keywords().len())
}

/// Concept sub-score in 0..=100 for `answer`.
#[must_use]
pub fn concept_score(answer: &str, question: &Question) -> f64 {
    let answer = answer.to_lowercase();
    let found = matched_concepts(&answer, question.expected_concepts()).len();
    ratio_percent(found, question.expected_concepts().len())
}

/// Length sub-score from the whitespace-separated word count of `answer`.
///
/// Each threshold is exclusive: 15 words falls in the `< 30` band, not `< 15`.
#[must_use]
pub fn length_score(answer: &str) -> f64 {
    match answer.split_whitespace().count() {
        0..5 => 10.0,
        5..15 => 30.0,
        15..30 => 50.0,
        30..50 => 70.0,
        _ => 85.0,
    }
}

//
// ─── ANALYZE ───────────────────────────────────────────────────────────────────
//

/// Score one answer against one question.
///
/// Pure and total: any string, including an empty one, yields a valid
/// analysis with a score in 0..=100.
///
/// # Examples
///
/// ```
/// # use interview_core::analyzer::analyze;
/// # use interview_core::model::Question;
/// let q = Question::new("What is HTTPS?", ["https", "tls"], ["Security features"], 1)?;
/// let analysis = analyze("HTTPS wraps HTTP in TLS", &q);
/// assert!(analysis.score <= 100);
/// assert_eq!(analysis.matched_keywords, ["https", "tls"]);
/// # Ok::<(), interview_core::model::QuestionError>(())
/// ```
#[must_use]
pub fn analyze(answer: &str, question: &Question) -> AnswerAnalysis {
    let lowered = answer.to_lowercase();

    let keywords = matched_keywords(&lowered, question.keywords());
    let concepts = matched_concepts(&lowered, question.expected_concepts());

    let keyword = ratio_percent(keywords.len(), question.keywords().len());
    let concept = ratio_percent(concepts.len(), question.expected_concepts().len());
    let length = length_score(answer);

    let blended = KEYWORD_WEIGHT * keyword + CONCEPT_WEIGHT * concept + LENGTH_WEIGHT * length;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = blended.round().clamp(0.0, 100.0) as u8;

    AnswerAnalysis {
        score,
        feedback: ScoreBand::from_score(score).feedback().to_string(),
        matched_keywords: keywords.into_iter().cloned().collect(),
        matched_concepts: concepts.into_iter().cloned().collect(),
    }
}

/// Stateless handle over [`analyze`], for callers that prefer an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAnalyzer;

impl ResponseAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn analyze(&self, answer: &str, question: &Question) -> AnswerAnalysis {
        analyze(answer, question)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

//! Compatibility scoring between answer sets

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::entities::{
    Answer, AnswerSet, CandidateRef, QuestionBank, QuestionItem, QuestionKind, ScoredCandidate,
};

/// Scores answer-set pairs against the weights of a question bank
///
/// For every question both sides answered, a similarity in `[0, 1]` is
/// weighted by the question weight; the weighted sum is normalised by the
/// total weight of those questions and mapped onto `[MIN_SCORE, MAX_SCORE]`.
#[derive(Debug, Clone)]
pub struct CompatibilityScorer {
    bank: Arc<QuestionBank>,
}

impl CompatibilityScorer {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 100.0;

    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Compatibility of two answer sets
    ///
    /// Answers to questions missing from the bank, and pairs whose answer
    /// types do not match the question, are ignored. With nothing jointly
    /// answered the score is `MIN_SCORE`.
    pub fn score(&self, a: &AnswerSet, b: &AnswerSet) -> f64 {
        // Sorted so the floating point sum is identical for (a, b) and (b, a)
        let mut joint: Vec<&str> = a
            .iter()
            .map(|(id, _)| id.as_str())
            .filter(|id| b.get(id).is_some())
            .collect();
        joint.sort_unstable();

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for id in joint {
            let (Some(question), Some(x), Some(y)) = (self.bank.get(id), a.get(id), b.get(id)) else {
                continue;
            };
            let Some(similarity) = similarity(&question.kind, x, y) else {
                tracing::debug!(question_id = id, "Skipping answer pair that does not fit its question");
                continue;
            };
            let weight = f64::from(question.weight);
            weighted += similarity * weight;
            total_weight += weight;
        }

        if total_weight == 0.0 {
            return Self::MIN_SCORE;
        }
        Self::MIN_SCORE + (Self::MAX_SCORE - Self::MIN_SCORE) * (weighted / total_weight)
    }

    /// Scores each candidate against the caller's answers, keeping pool order
    pub fn score_candidates(&self, answers: &AnswerSet, candidates: &[CandidateRef]) -> Vec<ScoredCandidate> {
        candidates
            .iter()
            .map(|candidate| ScoredCandidate::new(candidate.id, self.score(answers, &candidate.answers)))
            .collect()
    }

    /// Orders candidates by descending score, ties by ascending id
    pub fn rank(&self, mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        scored
    }

    /// Highest-weight bank questions the caller has not answered yet
    pub fn next_questions(&self, answered: &AnswerSet, count: usize) -> Vec<QuestionItem> {
        select_high_weight(self.bank.iter(), count, &answered.answered_ids())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Best match among `candidates`, if any
    pub fn best_match(&self, answers: &AnswerSet, candidates: &[CandidateRef]) -> Option<ScoredCandidate> {
        self.rank(self.score_candidates(answers, candidates))
            .into_iter()
            .next()
    }
}

/// Per-question similarity in `[0, 1]`; `None` when an answer does not fit the question type
fn similarity(kind: &QuestionKind, a: &Answer, b: &Answer) -> Option<f64> {
    match (kind, a, b) {
        (QuestionKind::Scale { min, max }, Answer::Scale { value: x }, Answer::Scale { value: y }) => {
            let (min, max) = (i64::from(*min), i64::from(*max));
            let span = max - min;
            if span <= 0 {
                return Some(if x == y { 1.0 } else { 0.0 });
            }
            let x = i64::from(*x).clamp(min, max);
            let y = i64::from(*y).clamp(min, max);
            Some(1.0 - (x - y).abs() as f64 / span as f64)
        }
        (QuestionKind::Multiple { .. }, Answer::Choice { option_id: x }, Answer::Choice { option_id: y }) => {
            Some(if x == y { 1.0 } else { 0.0 })
        }
        (QuestionKind::Boolean, Answer::Bool { value: x }, Answer::Bool { value: y }) => {
            Some(if x == y { 1.0 } else { 0.0 })
        }
        _ => None,
    }
}

/// The `count` highest-weight questions whose ids are not in `exclude`
///
/// Equal weights are ordered by ascending question id.
pub fn select_high_weight<'a>(
    questions: impl IntoIterator<Item = &'a QuestionItem>,
    count: usize,
    exclude: &HashSet<String>,
) -> Vec<&'a QuestionItem> {
    let mut remaining: Vec<&QuestionItem> = questions
        .into_iter()
        .filter(|question| !exclude.contains(&question.id))
        .collect();
    remaining.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.id.cmp(&b.id)));
    remaining.truncate(count);
    remaining
}

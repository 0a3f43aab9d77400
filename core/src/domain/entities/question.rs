//! Questionnaire reference data and typed answers.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::errors::{DomainError, DomainResult, MatchingError};

/// Question category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Personality,
    Lifestyle,
    Values,
    Communication,
    Relationship,
    Compatibility,
}

/// Selectable option of a multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
}

/// Question type with its type-specific parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Scale { min: i32, max: i32 },
    Multiple { options: Vec<QuestionOption> },
    Boolean,
}

/// A single questionnaire item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub id: String,
    pub text: String,
    pub category: QuestionCategory,
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Higher weight means more decisive for compatibility
    pub weight: u32,
}

impl QuestionItem {
    /// Whether `answer` has the right shape and range for this question
    pub fn accepts(&self, answer: &Answer) -> bool {
        match (&self.kind, answer) {
            (QuestionKind::Scale { min, max }, Answer::Scale { value }) => {
                (*min..=*max).contains(value)
            }
            (QuestionKind::Multiple { options }, Answer::Choice { option_id }) => {
                options.iter().any(|option| &option.id == option_id)
            }
            (QuestionKind::Boolean, Answer::Bool { .. }) => true,
            _ => false,
        }
    }
}

/// Typed answer value, one variant per question type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Answer {
    Scale { value: i32 },
    Choice { option_id: String },
    Bool { value: bool },
}

/// Mapping from question id to answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: HashMap<String, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an answer, replacing any previous answer to the same question
    pub fn insert(&mut self, question_id: impl Into<String>, answer: Answer) {
        self.answers.insert(question_id.into(), answer);
    }

    /// Builder-style insert
    pub fn with(mut self, question_id: impl Into<String>, answer: Answer) -> Self {
        self.insert(question_id, answer);
        self
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Answer)> {
        self.answers.iter()
    }

    /// Ids of every answered question
    pub fn answered_ids(&self) -> HashSet<String> {
        self.answers.keys().cloned().collect()
    }

    /// Merges a later quiz phase into this set; answers in `other` win
    pub fn merge(mut self, other: AnswerSet) -> Self {
        self.answers.extend(other.answers);
        self
    }
}

impl FromIterator<(String, Answer)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (String, Answer)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

/// Immutable bank of seed questions
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<QuestionItem>,
    index: HashMap<String, usize>,
}

impl QuestionBank {
    /// Builds a bank, rejecting duplicate ids, zero weights and malformed parameters
    pub fn new(questions: Vec<QuestionItem>) -> DomainResult<Self> {
        let mut index = HashMap::with_capacity(questions.len());

        for (position, question) in questions.iter().enumerate() {
            if question.weight == 0 {
                return Err(DomainError::Validation {
                    message: format!("Question {} has zero weight", question.id),
                });
            }
            let well_formed = match &question.kind {
                QuestionKind::Scale { min, max } => min < max,
                QuestionKind::Multiple { options } => options.len() >= 2,
                QuestionKind::Boolean => true,
            };
            if !well_formed {
                return Err(DomainError::Validation {
                    message: format!("Question {} has invalid parameters", question.id),
                });
            }
            if index.insert(question.id.clone(), position).is_some() {
                return Err(DomainError::Validation {
                    message: format!("Duplicate question id {}", question.id),
                });
            }
        }

        Ok(Self { questions, index })
    }

    pub fn get(&self, id: &str) -> Option<&QuestionItem> {
        self.index.get(id).map(|&position| &self.questions[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionItem> {
        self.questions.iter()
    }

    pub fn questions(&self) -> &[QuestionItem] {
        &self.questions
    }

    pub fn by_category(&self, category: QuestionCategory) -> impl Iterator<Item = &QuestionItem> {
        self.questions.iter().filter(move |q| q.category == category)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Checks every answer against its question
    pub fn validate_answers(&self, answers: &AnswerSet) -> DomainResult<()> {
        for (question_id, answer) in answers.iter() {
            let question = self.get(question_id).ok_or_else(|| MatchingError::UnknownQuestion {
                id: question_id.clone(),
            })?;
            if !question.accepts(answer) {
                return Err(MatchingError::InvalidAnswer {
                    question_id: question_id.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

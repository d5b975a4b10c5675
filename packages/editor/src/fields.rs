//! Typed scalar-field edits, one enum per entity kind.
//!
//! Field edits never touch ordering or references. Regex and scale edits
//! also route through the item's session state.

use crate::variables::{ItemVariables, QuizVariables};
use chrono::{DateTime, Utc};
use quiz_schema::{
    Direction, FeedbackDisplayPolicy, GradingPolicy, GrantPointsPolicy, ItemRecord,
    PeerReviewCollectionRecord, PeerReviewQuestion, QuestionKind, QuizItemOption, QuizRecord,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum QuizField {
    Title(String),
    Body(String),
    SubmitMessage(Option<String>),
    CourseId(Option<String>),
    Part(u32),
    Section(u32),
    Deadline(Option<DateTime<Utc>>),
    Open(Option<DateTime<Utc>>),
    Tries(u32),
    TriesLimited(bool),
    Points(u32),
    GrantPointsPolicy(GrantPointsPolicy),
    AutoConfirm(bool),
    AutoReject(bool),
    AwardPointsEvenIfWrong(bool),
    ExcludedFromScore(bool),
}

impl QuizField {
    pub(crate) fn apply(self, quiz: &mut QuizRecord, variables: &mut QuizVariables) {
        match self {
            QuizField::Title(title) => quiz.title = title,
            QuizField::Body(body) => quiz.body = body,
            QuizField::SubmitMessage(message) => quiz.submit_message = message,
            QuizField::CourseId(course_id) => quiz.course_id = course_id,
            QuizField::Part(part) => quiz.part = part,
            QuizField::Section(section) => quiz.section = section,
            QuizField::Deadline(deadline) => quiz.deadline = deadline,
            QuizField::Open(open) => quiz.open = open,
            QuizField::Tries(tries) => quiz.tries = tries,
            QuizField::TriesLimited(limited) => quiz.tries_limited = limited,
            QuizField::Points(points) => quiz.points = points,
            QuizField::GrantPointsPolicy(policy) => quiz.grant_points_policy = policy,
            QuizField::AutoConfirm(value) => quiz.auto_confirm = value,
            QuizField::AutoReject(value) => quiz.auto_reject = value,
            QuizField::AwardPointsEvenIfWrong(value) => quiz.award_points_even_if_wrong = value,
            QuizField::ExcludedFromScore(value) => quiz.excluded_from_score = value,
        }

        variables.valid_deadline = match (quiz.open, quiz.deadline) {
            (Some(open), Some(deadline)) => deadline >= open,
            _ => true,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ItemField {
    Title(String),
    Body(String),
    ValidityRegex(String),
    FormatRegex(String),
    MinWords(Option<u32>),
    MaxWords(Option<u32>),
    MinValue(i64),
    MaxValue(i64),
    MinLabel(Option<String>),
    MaxLabel(Option<String>),
    Direction(Direction),
    FeedbackDisplayPolicy(FeedbackDisplayPolicy),
    OptionCells(Option<Vec<Vec<String>>>),
    UsesSharedOptionFeedbackMessage(bool),
    SharedOptionFeedbackMessage(Option<String>),
    SuccessMessage(Option<String>),
    FailureMessage(Option<String>),
    Multi(bool),
    ShuffleOptions(bool),
    AllAnswersCorrect(bool),
    #[serde(rename = "multipleChoiceMultipleOptionsGradingPolicy")]
    GradingPolicy(GradingPolicy),
}

impl ItemField {
    pub(crate) fn apply(self, item: &mut ItemRecord, variables: &mut ItemVariables) {
        match self {
            ItemField::Title(title) => item.title = title,
            ItemField::Body(body) => item.body = body,
            ItemField::ValidityRegex(regex) => {
                if variables.set_regex(&regex) {
                    item.validity_regex = non_empty(regex);
                } else {
                    debug!(item_id = %item.id, "Keeping last valid validity regex");
                }
            }
            ItemField::FormatRegex(regex) => {
                if variables.set_format_regex(&regex) {
                    item.format_regex = non_empty(regex);
                } else {
                    debug!(item_id = %item.id, "Keeping last valid format regex");
                }
            }
            ItemField::MinWords(min) => item.min_words = min,
            ItemField::MaxWords(max) => item.max_words = max,
            ItemField::MinValue(min) => {
                variables.set_scale_min(min);
                item.min_value = Some(min);
            }
            ItemField::MaxValue(max) => {
                variables.set_scale_max(max);
                item.max_value = Some(max);
            }
            ItemField::MinLabel(label) => item.min_label = label,
            ItemField::MaxLabel(label) => item.max_label = label,
            ItemField::Direction(direction) => item.direction = direction,
            ItemField::FeedbackDisplayPolicy(policy) => item.feedback_display_policy = policy,
            ItemField::OptionCells(cells) => item.option_cells = cells,
            ItemField::UsesSharedOptionFeedbackMessage(value) => {
                item.uses_shared_option_feedback_message = value
            }
            ItemField::SharedOptionFeedbackMessage(message) => {
                item.shared_option_feedback_message = message
            }
            ItemField::SuccessMessage(message) => item.success_message = message,
            ItemField::FailureMessage(message) => item.failure_message = message,
            ItemField::Multi(value) => item.multi = value,
            ItemField::ShuffleOptions(value) => item.shuffle_options = value,
            ItemField::AllAnswersCorrect(value) => item.all_answers_correct = value,
            ItemField::GradingPolicy(policy) => {
                item.multiple_choice_multiple_options_grading_policy = policy
            }
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum OptionField {
    Title(String),
    Body(Option<String>),
    Correct(bool),
    SuccessMessage(Option<String>),
    FailureMessage(Option<String>),
}

impl OptionField {
    pub(crate) fn apply(self, option: &mut QuizItemOption) {
        match self {
            OptionField::Title(title) => option.title = title,
            OptionField::Body(body) => option.body = body,
            OptionField::Correct(correct) => option.correct = correct,
            OptionField::SuccessMessage(message) => option.success_message = message,
            OptionField::FailureMessage(message) => option.failure_message = message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum PeerReviewCollectionField {
    Title(String),
    Body(String),
}

impl PeerReviewCollectionField {
    pub(crate) fn apply(self, collection: &mut PeerReviewCollectionRecord) {
        match self {
            PeerReviewCollectionField::Title(title) => collection.title = title,
            PeerReviewCollectionField::Body(body) => collection.body = body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum QuestionField {
    Title(String),
    Body(Option<String>),
    #[serde(rename = "type")]
    Kind(QuestionKind),
    Default(bool),
    AnswerRequired(bool),
}

impl QuestionField {
    pub(crate) fn apply(self, question: &mut PeerReviewQuestion) {
        match self {
            QuestionField::Title(title) => question.title = title,
            QuestionField::Body(body) => question.body = body,
            QuestionField::Kind(kind) => question.kind = kind,
            QuestionField::Default(value) => question.default = value,
            QuestionField::AnswerRequired(value) => question.answer_required = value,
        }
    }
}

//! # Entity Schemas
//!
//! Each container entity is generic over the representation of its
//! children. The nested document form carries child entities inline; the
//! flat form carries child ids:
//!
//! ```text
//! Quiz ──items──────────────────▶ QuizItem ──options──▶ QuizItemOption
//!      └─peerReviewCollections──▶ PeerReviewCollection ──questions──▶ PeerReviewQuestion
//! ```
//!
//! Containment is single-parent: every child is listed by exactly one
//! parent and points back at it (`quizId`, `quizItemId`,
//! `peerReviewCollectionId`).

use crate::kinds::{
    Direction, FeedbackDisplayPolicy, GradingPolicy, GrantPointsPolicy, ItemKind, QuestionKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;

/// Opaque entity id, unique within its kind
pub type EntityId = String;

/// Host fields the editor does not model, passed back untouched
pub type ExtraFields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz<I, P> {
    pub id: EntityId,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub part: u32,
    #[serde(default)]
    pub section: u32,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub open: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tries: u32,
    #[serde(default)]
    pub tries_limited: bool,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub grant_points_policy: GrantPointsPolicy,
    #[serde(default)]
    pub auto_confirm: bool,
    #[serde(default)]
    pub auto_reject: bool,
    #[serde(default)]
    pub award_points_even_if_wrong: bool,
    #[serde(default)]
    pub excluded_from_score: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub submit_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default = "Vec::new")]
    pub items: Vec<I>,
    #[serde(default = "Vec::new")]
    pub peer_review_collections: Vec<P>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl<I, P> Quiz<I, P> {
    /// Empty quiz used when the host has no document yet
    pub fn blank(id: EntityId, tries: u32, points: u32) -> Self {
        Self {
            id,
            course_id: None,
            part: 0,
            section: 0,
            deadline: None,
            open: None,
            tries,
            tries_limited: true,
            points,
            grant_points_policy: GrantPointsPolicy::default(),
            auto_confirm: false,
            auto_reject: false,
            award_points_even_if_wrong: false,
            excluded_from_score: false,
            title: String::new(),
            body: String::new(),
            submit_message: None,
            created_at: None,
            updated_at: None,
            items: Vec::new(),
            peer_review_collections: Vec::new(),
            extra: ExtraFields::new(),
        }
    }

    /// Swap in a new set of children, dropping the current ones
    pub fn with_children<I2, P2>(
        self,
        items: Vec<I2>,
        peer_review_collections: Vec<P2>,
    ) -> Quiz<I2, P2> {
        Quiz {
            id: self.id,
            course_id: self.course_id,
            part: self.part,
            section: self.section,
            deadline: self.deadline,
            open: self.open,
            tries: self.tries,
            tries_limited: self.tries_limited,
            points: self.points,
            grant_points_policy: self.grant_points_policy,
            auto_confirm: self.auto_confirm,
            auto_reject: self.auto_reject,
            award_points_even_if_wrong: self.award_points_even_if_wrong,
            excluded_from_score: self.excluded_from_score,
            title: self.title,
            body: self.body,
            submit_message: self.submit_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
            peer_review_collections,
            extra: self.extra,
        }
    }

    /// Rebuild the quiz with converted children, stopping at the first error
    pub fn try_map_children<I2, P2, E>(
        mut self,
        map_item: impl FnMut(I) -> Result<I2, E>,
        map_collection: impl FnMut(P) -> Result<P2, E>,
    ) -> Result<Quiz<I2, P2>, E> {
        let items = std::mem::take(&mut self.items)
            .into_iter()
            .map(map_item)
            .collect::<Result<Vec<_>, E>>()?;
        let peer_review_collections = std::mem::take(&mut self.peer_review_collections)
            .into_iter()
            .map(map_collection)
            .collect::<Result<Vec<_>, E>>()?;

        Ok(self.with_children(items, peer_review_collections))
    }

    pub fn map_children<I2, P2>(
        self,
        mut map_item: impl FnMut(I) -> I2,
        mut map_collection: impl FnMut(P) -> P2,
    ) -> Quiz<I2, P2> {
        let mapped = self.try_map_children(
            |item| Ok::<_, Infallible>(map_item(item)),
            |collection| Ok(map_collection(collection)),
        );
        match mapped {
            Ok(quiz) => quiz,
            Err(never) => match never {},
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem<O> {
    pub id: EntityId,
    pub quiz_id: EntityId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub order: usize,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub validity_regex: Option<String>,
    #[serde(default)]
    pub format_regex: Option<String>,
    #[serde(default)]
    pub min_words: Option<u32>,
    #[serde(default)]
    pub max_words: Option<u32>,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub min_label: Option<String>,
    #[serde(default)]
    pub max_label: Option<String>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub feedback_display_policy: FeedbackDisplayPolicy,
    #[serde(default)]
    pub option_cells: Option<Vec<Vec<String>>>,
    #[serde(default = "Vec::new")]
    pub options: Vec<O>,
    #[serde(default)]
    pub uses_shared_option_feedback_message: bool,
    #[serde(default)]
    pub shared_option_feedback_message: Option<String>,
    #[serde(default)]
    pub success_message: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub shuffle_options: bool,
    #[serde(default)]
    pub all_answers_correct: bool,
    #[serde(default)]
    pub multiple_choice_multiple_options_grading_policy: GradingPolicy,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl<O> QuizItem<O> {
    pub fn new(id: EntityId, quiz_id: EntityId, kind: ItemKind, order: usize) -> Self {
        Self {
            id,
            quiz_id,
            kind,
            order,
            title: String::new(),
            body: String::new(),
            validity_regex: None,
            format_regex: None,
            min_words: None,
            max_words: None,
            min_value: None,
            max_value: None,
            min_label: None,
            max_label: None,
            direction: Direction::default(),
            feedback_display_policy: FeedbackDisplayPolicy::default(),
            option_cells: None,
            options: Vec::new(),
            uses_shared_option_feedback_message: false,
            shared_option_feedback_message: None,
            success_message: None,
            failure_message: None,
            multi: false,
            shuffle_options: false,
            all_answers_correct: false,
            multiple_choice_multiple_options_grading_policy: GradingPolicy::default(),
            created_at: None,
            updated_at: None,
            extra: ExtraFields::new(),
        }
    }

    /// Swap in a new option list, dropping the current one
    pub fn with_options<O2>(self, options: Vec<O2>) -> QuizItem<O2> {
        QuizItem {
            id: self.id,
            quiz_id: self.quiz_id,
            kind: self.kind,
            order: self.order,
            title: self.title,
            body: self.body,
            validity_regex: self.validity_regex,
            format_regex: self.format_regex,
            min_words: self.min_words,
            max_words: self.max_words,
            min_value: self.min_value,
            max_value: self.max_value,
            min_label: self.min_label,
            max_label: self.max_label,
            direction: self.direction,
            feedback_display_policy: self.feedback_display_policy,
            option_cells: self.option_cells,
            options,
            uses_shared_option_feedback_message: self.uses_shared_option_feedback_message,
            shared_option_feedback_message: self.shared_option_feedback_message,
            success_message: self.success_message,
            failure_message: self.failure_message,
            multi: self.multi,
            shuffle_options: self.shuffle_options,
            all_answers_correct: self.all_answers_correct,
            multiple_choice_multiple_options_grading_policy: self
                .multiple_choice_multiple_options_grading_policy,
            created_at: self.created_at,
            updated_at: self.updated_at,
            extra: self.extra,
        }
    }

    pub fn try_map_options<O2, E>(
        mut self,
        map_option: impl FnMut(O) -> Result<O2, E>,
    ) -> Result<QuizItem<O2>, E> {
        let options = std::mem::take(&mut self.options)
            .into_iter()
            .map(map_option)
            .collect::<Result<Vec<_>, E>>()?;

        Ok(self.with_options(options))
    }

    pub fn map_options<O2>(self, mut map_option: impl FnMut(O) -> O2) -> QuizItem<O2> {
        match self.try_map_options(|option| Ok::<_, Infallible>(map_option(option))) {
            Ok(item) => item,
            Err(never) => match never {},
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItemOption {
    pub id: EntityId,
    /// Empty when the host omits it; filled from the parent on normalize
    #[serde(default)]
    pub quiz_item_id: EntityId,
    pub order: usize,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub success_message: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl QuizItemOption {
    pub fn new(id: EntityId, quiz_item_id: EntityId, order: usize) -> Self {
        Self {
            id,
            quiz_item_id,
            order,
            correct: false,
            title: String::new(),
            body: None,
            success_message: None,
            failure_message: None,
            created_at: None,
            updated_at: None,
            extra: ExtraFields::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewCollection<Q> {
    pub id: EntityId,
    pub quiz_id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "Vec::new")]
    pub questions: Vec<Q>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl<Q> PeerReviewCollection<Q> {
    pub fn new(id: EntityId, quiz_id: EntityId) -> Self {
        Self {
            id,
            quiz_id,
            title: String::new(),
            body: String::new(),
            questions: Vec::new(),
            created_at: None,
            updated_at: None,
            extra: ExtraFields::new(),
        }
    }

    /// Swap in a new question list, dropping the current one
    pub fn with_questions<Q2>(self, questions: Vec<Q2>) -> PeerReviewCollection<Q2> {
        PeerReviewCollection {
            id: self.id,
            quiz_id: self.quiz_id,
            title: self.title,
            body: self.body,
            questions,
            created_at: self.created_at,
            updated_at: self.updated_at,
            extra: self.extra,
        }
    }

    pub fn try_map_questions<Q2, E>(
        mut self,
        map_question: impl FnMut(Q) -> Result<Q2, E>,
    ) -> Result<PeerReviewCollection<Q2>, E> {
        let questions = std::mem::take(&mut self.questions)
            .into_iter()
            .map(map_question)
            .collect::<Result<Vec<_>, E>>()?;

        Ok(self.with_questions(questions))
    }

    pub fn map_questions<Q2>(
        self,
        mut map_question: impl FnMut(Q) -> Q2,
    ) -> PeerReviewCollection<Q2> {
        match self.try_map_questions(|question| Ok::<_, Infallible>(map_question(question))) {
            Ok(collection) => collection,
            Err(never) => match never {},
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewQuestion {
    pub id: EntityId,
    pub quiz_id: EntityId,
    pub peer_review_collection_id: EntityId,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub order: usize,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub answer_required: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl PeerReviewQuestion {
    pub fn new(
        id: EntityId,
        quiz_id: EntityId,
        peer_review_collection_id: EntityId,
        kind: QuestionKind,
        order: usize,
    ) -> Self {
        Self {
            id,
            quiz_id,
            peer_review_collection_id,
            kind,
            order,
            default: false,
            answer_required: true,
            title: String::new(),
            body: None,
            created_at: None,
            updated_at: None,
            extra: ExtraFields::new(),
        }
    }
}

// Nested document form, as exchanged with the host
pub type QuizDocument = Quiz<ItemDocument, PeerReviewCollectionDocument>;
pub type ItemDocument = QuizItem<QuizItemOption>;
pub type PeerReviewCollectionDocument = PeerReviewCollection<PeerReviewQuestion>;

// Flat form, children replaced by ids
pub type QuizRecord = Quiz<EntityId, EntityId>;
pub type ItemRecord = QuizItem<EntityId>;
pub type PeerReviewCollectionRecord = PeerReviewCollection<EntityId>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_deserializes_with_missing_optional_fields() {
        let doc: QuizDocument = serde_json::from_value(json!({
            "id": "quiz-1",
            "items": [{
                "id": "item-1",
                "quizId": "quiz-1",
                "type": "multiple-choice",
                "order": 0,
                "options": [{ "id": "option-1", "quizItemId": "item-1", "order": 0 }]
            }]
        }))
        .unwrap();

        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].kind, ItemKind::MultipleChoice);
        assert_eq!(doc.items[0].options[0].id, "option-1");
        assert!(doc.peer_review_collections.is_empty());
    }

    #[test]
    fn test_unmodelled_fields_survive_a_round_trip() {
        let doc: QuizDocument = serde_json::from_value(json!({
            "id": "quiz-1",
            "hostOnly": 42,
            "items": [{
                "id": "item-1",
                "quizId": "quiz-1",
                "type": "open",
                "order": 0,
                "timelineItems": [{ "year": 1969 }]
            }]
        }))
        .unwrap();

        assert_eq!(doc.extra["hostOnly"], 42);
        assert!(!doc.extra.contains_key("items"));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["hostOnly"], 42);
        assert_eq!(value["items"][0]["timelineItems"][0]["year"], 1969);
    }

    #[test]
    fn test_option_without_parent_id_deserializes() {
        let option: QuizItemOption =
            serde_json::from_value(json!({ "id": "option-1", "order": 0 })).unwrap();
        assert_eq!(option.quiz_item_id, "");
    }

    #[test]
    fn test_fields_serialize_in_camel_case() {
        let item: ItemRecord = QuizItem::new("item-1".into(), "quiz-1".into(), ItemKind::Open, 0);
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["quizId"], "quiz-1");
        assert_eq!(value["type"], "open");
        assert!(value.get("validityRegex").is_some());
        assert_eq!(value["multipleChoiceMultipleOptionsGradingPolicy"], "default");
    }

    #[test]
    fn test_map_children_keeps_scalar_fields() {
        let mut quiz: Quiz<u32, u32> = Quiz::blank("quiz-1".into(), 3, 2);
        quiz.title = "Week 1".into();
        quiz.items = vec![1, 2];
        quiz.peer_review_collections = vec![7];

        let mapped = quiz.map_children(|n| n.to_string(), |n| n * 2);

        assert_eq!(mapped.title, "Week 1");
        assert_eq!(mapped.tries, 3);
        assert_eq!(mapped.items, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(mapped.peer_review_collections, vec![14]);
    }

    #[test]
    fn test_try_map_stops_at_first_error() {
        let mut collection: PeerReviewCollection<u32> =
            PeerReviewCollection::new("prc-1".into(), "quiz-1".into());
        collection.questions = vec![1, 2, 3];

        let result = collection.try_map_questions(|n| if n == 2 { Err(n) } else { Ok(n) });
        assert_eq!(result.unwrap_err(), 2);
    }
}

//! # Denormalizer
//!
//! Rebuilds the nested quiz document from the flat tables. Child arrays
//! follow the order of the parent's id lists. A referenced id that is not
//! in its table is a broken store, never an empty child: the whole rebuild
//! fails so a partial document can't reach the host.

use quiz_schema::{
    EntityId, EntityKind, EntityTables, ItemDocument, PeerReviewCollectionDocument,
    PeerReviewQuestion, QuizDocument, QuizItemOption,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, instrument};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenormalizeError {
    #[error("Missing {kind} entity: {id}")]
    MissingEntity { kind: EntityKind, id: EntityId },
}

/// Reconstruct the nested document rooted at `root`
#[instrument(skip(entities), fields(items = entities.items.len()))]
pub fn denormalize(entities: &EntityTables, root: &str) -> Result<QuizDocument, DenormalizeError> {
    let quiz = lookup(&entities.quizzes, EntityKind::Quiz, root)?;

    quiz.clone()
        .try_map_children(|id| item(entities, &id), |id| collection(entities, &id))
        .inspect_err(|e| error!(error = %e, "Quiz store is inconsistent"))
}

fn item(entities: &EntityTables, id: &str) -> Result<ItemDocument, DenormalizeError> {
    lookup(&entities.items, EntityKind::Item, id)?
        .clone()
        .try_map_options(|option_id| option(entities, &option_id))
}

fn option(entities: &EntityTables, id: &str) -> Result<QuizItemOption, DenormalizeError> {
    lookup(&entities.options, EntityKind::Option, id).cloned()
}

fn collection(
    entities: &EntityTables,
    id: &str,
) -> Result<PeerReviewCollectionDocument, DenormalizeError> {
    lookup(&entities.peer_review_collections, EntityKind::PeerReviewCollection, id)?
        .clone()
        .try_map_questions(|question_id| question(entities, &question_id))
}

fn question(entities: &EntityTables, id: &str) -> Result<PeerReviewQuestion, DenormalizeError> {
    lookup(&entities.questions, EntityKind::Question, id).cloned()
}

fn lookup<'a, T>(
    table: &'a HashMap<EntityId, T>,
    kind: EntityKind,
    id: &str,
) -> Result<&'a T, DenormalizeError> {
    table.get(id).ok_or_else(|| DenormalizeError::MissingEntity {
        kind,
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use quiz_schema::{ItemKind, PeerReviewCollection, Quiz, QuizItem};

    fn sample_document() -> QuizDocument {
        let mut item: ItemDocument =
            QuizItem::new("item-1".into(), "quiz-1".into(), ItemKind::MultipleChoice, 0);
        item.options = vec![QuizItemOption::new("option-1".into(), "item-1".into(), 0)];

        let mut collection: PeerReviewCollectionDocument =
            PeerReviewCollection::new("prc-1".into(), "quiz-1".into());
        collection.questions = vec![PeerReviewQuestion::new(
            "question-1".into(),
            "quiz-1".into(),
            "prc-1".into(),
            quiz_schema::QuestionKind::Grade,
            0,
        )];

        let mut quiz: QuizDocument = Quiz::blank("quiz-1".into(), 1, 1);
        quiz.items = vec![item];
        quiz.peer_review_collections = vec![collection];
        quiz
    }

    #[test]
    fn test_denormalize_inverts_normalize() {
        let doc = sample_document();
        let normalized = normalize(doc.clone());

        let rebuilt = denormalize(&normalized.entities, &normalized.result).unwrap();
        assert_eq!(rebuilt, doc);
    }

    #[test]
    fn test_missing_option_fails() {
        let mut normalized = normalize(sample_document());
        normalized.entities.options.remove("option-1");

        let err = denormalize(&normalized.entities, &normalized.result).unwrap_err();
        assert_eq!(
            err,
            DenormalizeError::MissingEntity {
                kind: EntityKind::Option,
                id: "option-1".into()
            }
        );
    }

    #[test]
    fn test_missing_root_fails() {
        let normalized = normalize(sample_document());

        let err = denormalize(&normalized.entities, "quiz-2").unwrap_err();
        assert!(matches!(err, DenormalizeError::MissingEntity { kind: EntityKind::Quiz, .. }));
    }
}

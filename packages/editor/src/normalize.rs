//! # Normalizer
//!
//! Flattens a nested quiz document into one table per entity kind. Each
//! containment edge is walked depth-first: children are hoisted into their
//! table first, then the parent is stored with its child array replaced by
//! the children's ids (in the same order).

use quiz_schema::{
    EntityId, EntityKind, EntityTables, ItemDocument, Normalized, PeerReviewCollectionDocument,
    PeerReviewQuestion, QuizDocument, QuizItemOption,
};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Normalize a nested quiz document
#[instrument(skip(doc), fields(quiz_id = %doc.id, items = doc.items.len()))]
pub fn normalize(doc: QuizDocument) -> Normalized {
    let mut normalizer = Normalizer::default();
    let result = normalizer.quiz(doc);

    debug!(entities = normalizer.entities.len(), "Normalized quiz");

    Normalized {
        entities: normalizer.entities,
        result,
    }
}

#[derive(Default)]
struct Normalizer {
    entities: EntityTables,
}

impl Normalizer {
    fn quiz(&mut self, mut doc: QuizDocument) -> EntityId {
        let items: Vec<EntityId> = std::mem::take(&mut doc.items)
            .into_iter()
            .map(|item| self.item(item))
            .collect();
        let collections: Vec<EntityId> = std::mem::take(&mut doc.peer_review_collections)
            .into_iter()
            .map(|collection| self.collection(collection))
            .collect();

        let record = doc.with_children(items, collections);
        let id = record.id.clone();
        insert_unique(&mut self.entities.quizzes, EntityKind::Quiz, id.clone(), record);
        id
    }

    fn item(&mut self, item: ItemDocument) -> EntityId {
        let item_id = item.id.clone();
        let record = item.map_options(|option| self.option(option, &item_id));
        let id = record.id.clone();
        insert_unique(&mut self.entities.items, EntityKind::Item, id.clone(), record);
        id
    }

    fn option(&mut self, mut option: QuizItemOption, item_id: &str) -> EntityId {
        if option.quiz_item_id.is_empty() {
            option.quiz_item_id = item_id.to_string();
        }
        let id = option.id.clone();
        insert_unique(&mut self.entities.options, EntityKind::Option, id.clone(), option);
        id
    }

    fn collection(&mut self, collection: PeerReviewCollectionDocument) -> EntityId {
        let record = collection.map_questions(|question| self.question(question));
        let id = record.id.clone();
        insert_unique(
            &mut self.entities.peer_review_collections,
            EntityKind::PeerReviewCollection,
            id.clone(),
            record,
        );
        id
    }

    fn question(&mut self, question: PeerReviewQuestion) -> EntityId {
        let id = question.id.clone();
        insert_unique(&mut self.entities.questions, EntityKind::Question, id.clone(), question);
        id
    }
}

// Unique ids are a precondition on host documents; a repeat overwrites.
fn insert_unique<T>(table: &mut HashMap<EntityId, T>, kind: EntityKind, id: EntityId, entity: T) {
    if table.insert(id.clone(), entity).is_some() {
        warn!(kind = %kind, id = %id, "Duplicate entity id in quiz document");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_schema::{ItemKind, Quiz, QuizItem};

    fn sample_document() -> QuizDocument {
        let mut item: ItemDocument = QuizItem::new("item-1".into(), "quiz-1".into(), ItemKind::MultipleChoice, 0);
        item.options = vec![
            QuizItemOption::new("option-1".into(), "item-1".into(), 0),
            QuizItemOption::new("option-2".into(), "item-1".into(), 1),
        ];

        let mut quiz: QuizDocument = Quiz::blank("quiz-1".into(), 1, 1);
        quiz.items = vec![item];
        quiz
    }

    #[test]
    fn test_children_become_id_lists() {
        let normalized = normalize(sample_document());

        assert_eq!(normalized.result, "quiz-1");
        assert_eq!(normalized.entities.quizzes["quiz-1"].items, vec!["item-1".to_string()]);
        assert_eq!(
            normalized.entities.items["item-1"].options,
            vec!["option-1".to_string(), "option-2".to_string()]
        );
        assert_eq!(normalized.entities.options.len(), 2);
        assert!(normalized.entities.questions.is_empty());
    }

    #[test]
    fn test_missing_option_parent_is_filled_in() {
        let mut doc = sample_document();
        doc.items[0].options[0].quiz_item_id = String::new();

        let normalized = normalize(doc);

        assert_eq!(normalized.entities.options["option-1"].quiz_item_id, "item-1");
        assert_eq!(normalized.entities.options["option-2"].quiz_item_id, "item-1");
    }

    #[test]
    fn test_duplicate_ids_keep_last_entity() {
        let mut doc = sample_document();
        doc.items[0].options[1].id = "option-1".into();
        doc.items[0].options[1].title = "second".into();

        let normalized = normalize(doc);

        assert_eq!(normalized.entities.options.len(), 1);
        assert_eq!(normalized.entities.options["option-1"].title, "second");
    }
}

//! # Quiz Mutations
//!
//! The closed set of operations that change a quiz store.
//!
//! ## Semantics
//!
//! - Every mutation is validated against the tables before it touches them.
//!   A failed validation leaves tables and session state unchanged.
//! - New entity ids are allocated up front and carried in the mutation, so
//!   applying one is deterministic.
//! - `order` is dense within each sibling group. Creation appends at
//!   `len`, deletion closes the gap, moves swap with the neighbour whose
//!   order differs by one. Id-list positions are never rearranged.
//! - Deleting a container does not remove its children here. The
//!   post-effect engine expands the cascade into child deletions first.

use crate::fields::{ItemField, OptionField, PeerReviewCollectionField, QuestionField, QuizField};
use crate::variables::{
    ItemVariables, OptionVariables, PeerReviewCollectionVariables, QuestionVariables, ScaleBounds,
    SessionVariables,
};
use quiz_common::IdGenerator;
use quiz_schema::{
    EntityId, EntityKind, EntityTables, ItemKind, ItemRecord, PeerReviewCollection,
    PeerReviewCollectionRecord, PeerReviewQuestion, QuestionKind, QuizItem, QuizItemOption,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Operations on the normalized quiz store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    CreateItem {
        quiz_id: EntityId,
        item_id: EntityId,
        kind: ItemKind,
    },

    /// Copy an item and all of its options under fresh ids
    CreateDuplicateItem {
        quiz_id: EntityId,
        source_item_id: EntityId,
        item_id: EntityId,
        /// One new id per source option, in the source's option order
        option_ids: Vec<EntityId>,
    },

    DeleteItem {
        item_id: EntityId,
        quiz_id: EntityId,
    },

    MoveItemUp {
        item_id: EntityId,
    },

    MoveItemDown {
        item_id: EntityId,
    },

    CreateOption {
        item_id: EntityId,
        option_id: EntityId,
    },

    DeleteOption {
        option_id: EntityId,
        item_id: EntityId,
    },

    CreatePeerReviewCollection {
        quiz_id: EntityId,
        collection_id: EntityId,
    },

    DeletePeerReviewCollection {
        collection_id: EntityId,
    },

    CreateQuestion {
        quiz_id: EntityId,
        collection_id: EntityId,
        question_id: EntityId,
        kind: QuestionKind,
    },

    DeleteQuestion {
        question_id: EntityId,
        collection_id: EntityId,
    },

    MoveQuestionUp {
        question_id: EntityId,
    },

    MoveQuestionDown {
        question_id: EntityId,
    },

    EditQuiz {
        quiz_id: EntityId,
        field: QuizField,
    },

    EditItem {
        item_id: EntityId,
        field: ItemField,
    },

    EditOption {
        option_id: EntityId,
        field: OptionField,
    },

    EditPeerReviewCollection {
        collection_id: EntityId,
        field: PeerReviewCollectionField,
    },

    EditQuestion {
        question_id: EntityId,
        field: QuestionField,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: EntityKind, id: EntityId },

    #[error("{kind} {id} is not a child of {parent}")]
    NotAChild {
        kind: EntityKind,
        id: EntityId,
        parent: EntityId,
    },

    #[error("{kind} id already in use: {id}")]
    DuplicateId { kind: EntityKind, id: EntityId },

    #[error("Items of type {kind} don't support {operation}")]
    UnsupportedForKind {
        kind: ItemKind,
        operation: &'static str,
    },

    #[error("Invalid mutation: {0}")]
    InvalidMutation(String),
}

/// Whether a mutation changed the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOutcome {
    Applied,
    /// Defined no-op, such as moving the first item up
    Noop,
}

impl Mutation {
    pub fn create_item(ids: &mut dyn IdGenerator, quiz_id: &str, kind: ItemKind) -> Self {
        Mutation::CreateItem {
            quiz_id: quiz_id.to_string(),
            item_id: ids.next_id(),
            kind,
        }
    }

    /// Allocates one option id per option of the source item
    pub fn create_duplicate_item(
        ids: &mut dyn IdGenerator,
        tables: &EntityTables,
        quiz_id: &str,
        source_item_id: &str,
    ) -> Result<Self, MutationError> {
        let source = find(&tables.items, EntityKind::Item, source_item_id)?;

        Ok(Mutation::CreateDuplicateItem {
            quiz_id: quiz_id.to_string(),
            source_item_id: source_item_id.to_string(),
            item_id: ids.next_id(),
            option_ids: source.options.iter().map(|_| ids.next_id()).collect(),
        })
    }

    pub fn create_option(ids: &mut dyn IdGenerator, item_id: &str) -> Self {
        Mutation::CreateOption {
            item_id: item_id.to_string(),
            option_id: ids.next_id(),
        }
    }

    pub fn create_peer_review_collection(ids: &mut dyn IdGenerator, quiz_id: &str) -> Self {
        Mutation::CreatePeerReviewCollection {
            quiz_id: quiz_id.to_string(),
            collection_id: ids.next_id(),
        }
    }

    pub fn create_question(
        ids: &mut dyn IdGenerator,
        quiz_id: &str,
        collection_id: &str,
        kind: QuestionKind,
    ) -> Self {
        Mutation::CreateQuestion {
            quiz_id: quiz_id.to_string(),
            collection_id: collection_id.to_string(),
            question_id: ids.next_id(),
            kind,
        }
    }

    /// The entity a mutation is addressed to
    pub fn target(&self) -> (EntityKind, &EntityId) {
        match self {
            Mutation::CreateItem { item_id, .. }
            | Mutation::CreateDuplicateItem { item_id, .. }
            | Mutation::DeleteItem { item_id, .. }
            | Mutation::MoveItemUp { item_id }
            | Mutation::MoveItemDown { item_id }
            | Mutation::EditItem { item_id, .. } => (EntityKind::Item, item_id),

            Mutation::CreateOption { option_id, .. }
            | Mutation::DeleteOption { option_id, .. }
            | Mutation::EditOption { option_id, .. } => (EntityKind::Option, option_id),

            Mutation::CreatePeerReviewCollection { collection_id, .. }
            | Mutation::DeletePeerReviewCollection { collection_id }
            | Mutation::EditPeerReviewCollection { collection_id, .. } => {
                (EntityKind::PeerReviewCollection, collection_id)
            }

            Mutation::CreateQuestion { question_id, .. }
            | Mutation::DeleteQuestion { question_id, .. }
            | Mutation::MoveQuestionUp { question_id }
            | Mutation::MoveQuestionDown { question_id }
            | Mutation::EditQuestion { question_id, .. } => (EntityKind::Question, question_id),

            Mutation::EditQuiz { quiz_id, .. } => (EntityKind::Quiz, quiz_id),
        }
    }

    /// Check the mutation against the current tables without changing them
    pub fn validate(&self, tables: &EntityTables) -> Result<(), MutationError> {
        match self {
            Mutation::CreateItem { quiz_id, item_id, .. } => {
                find(&tables.quizzes, EntityKind::Quiz, quiz_id)?;
                fresh(&tables.items, EntityKind::Item, item_id)
            }

            Mutation::CreateDuplicateItem {
                quiz_id,
                source_item_id,
                item_id,
                option_ids,
            } => {
                find(&tables.quizzes, EntityKind::Quiz, quiz_id)?;
                let source = find(&tables.items, EntityKind::Item, source_item_id)?;
                if source.quiz_id != *quiz_id {
                    return Err(not_a_child(EntityKind::Item, source_item_id, quiz_id));
                }
                fresh(&tables.items, EntityKind::Item, item_id)?;

                if option_ids.len() != source.options.len() {
                    return Err(MutationError::InvalidMutation(format!(
                        "duplicate of {} needs {} option ids, got {}",
                        source_item_id,
                        source.options.len(),
                        option_ids.len()
                    )));
                }
                let mut seen = HashSet::new();
                for option_id in option_ids {
                    fresh(&tables.options, EntityKind::Option, option_id)?;
                    if !seen.insert(option_id) {
                        return Err(MutationError::DuplicateId {
                            kind: EntityKind::Option,
                            id: option_id.clone(),
                        });
                    }
                }
                Ok(())
            }

            Mutation::DeleteItem { item_id, quiz_id } => {
                find(&tables.items, EntityKind::Item, item_id)?;
                let quiz = find(&tables.quizzes, EntityKind::Quiz, quiz_id)?;
                if !quiz.items.contains(item_id) {
                    return Err(not_a_child(EntityKind::Item, item_id, quiz_id));
                }
                Ok(())
            }

            Mutation::MoveItemUp { item_id } | Mutation::MoveItemDown { item_id } => {
                find(&tables.items, EntityKind::Item, item_id).map(drop)
            }

            Mutation::CreateOption { item_id, option_id } => {
                let item = find(&tables.items, EntityKind::Item, item_id)?;
                if !item.kind.traits().has_options {
                    return Err(MutationError::UnsupportedForKind {
                        kind: item.kind,
                        operation: "options",
                    });
                }
                fresh(&tables.options, EntityKind::Option, option_id)
            }

            Mutation::DeleteOption { option_id, item_id } => {
                find(&tables.options, EntityKind::Option, option_id)?;
                let item = find(&tables.items, EntityKind::Item, item_id)?;
                if !item.options.contains(option_id) {
                    return Err(not_a_child(EntityKind::Option, option_id, item_id));
                }
                Ok(())
            }

            Mutation::CreatePeerReviewCollection {
                quiz_id,
                collection_id,
            } => {
                find(&tables.quizzes, EntityKind::Quiz, quiz_id)?;
                fresh(
                    &tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    collection_id,
                )
            }

            Mutation::DeletePeerReviewCollection { collection_id } => {
                let collection = find(
                    &tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    collection_id,
                )?;
                find(&tables.quizzes, EntityKind::Quiz, &collection.quiz_id).map(drop)
            }

            Mutation::CreateQuestion {
                quiz_id,
                collection_id,
                question_id,
                ..
            } => {
                find(&tables.quizzes, EntityKind::Quiz, quiz_id)?;
                let collection = find(
                    &tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    collection_id,
                )?;
                if collection.quiz_id != *quiz_id {
                    return Err(not_a_child(
                        EntityKind::PeerReviewCollection,
                        collection_id,
                        quiz_id,
                    ));
                }
                fresh(&tables.questions, EntityKind::Question, question_id)
            }

            Mutation::DeleteQuestion {
                question_id,
                collection_id,
            } => {
                find(&tables.questions, EntityKind::Question, question_id)?;
                let collection = find(
                    &tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    collection_id,
                )?;
                if !collection.questions.contains(question_id) {
                    return Err(not_a_child(EntityKind::Question, question_id, collection_id));
                }
                Ok(())
            }

            Mutation::MoveQuestionUp { question_id } | Mutation::MoveQuestionDown { question_id } => {
                find(&tables.questions, EntityKind::Question, question_id).map(drop)
            }

            Mutation::EditQuiz { quiz_id, .. } => {
                find(&tables.quizzes, EntityKind::Quiz, quiz_id).map(drop)
            }
            Mutation::EditItem { item_id, .. } => {
                find(&tables.items, EntityKind::Item, item_id).map(drop)
            }
            Mutation::EditOption { option_id, .. } => {
                find(&tables.options, EntityKind::Option, option_id).map(drop)
            }
            Mutation::EditPeerReviewCollection { collection_id, .. } => find(
                &tables.peer_review_collections,
                EntityKind::PeerReviewCollection,
                collection_id,
            )
            .map(drop),
            Mutation::EditQuestion { question_id, .. } => {
                find(&tables.questions, EntityKind::Question, question_id).map(drop)
            }
        }
    }

    /// Validate, then apply to the tables and their session state
    pub(crate) fn apply(
        &self,
        tables: &mut EntityTables,
        variables: &mut SessionVariables,
        scale: ScaleBounds,
    ) -> Result<MutationOutcome, MutationError> {
        self.validate(tables)?;

        match self {
            Mutation::CreateItem {
                quiz_id,
                item_id,
                kind,
            } => {
                let quiz = find_mut(&mut tables.quizzes, EntityKind::Quiz, quiz_id)?;
                let mut item: ItemRecord =
                    QuizItem::new(item_id.clone(), quiz_id.clone(), *kind, quiz.items.len());
                apply_kind_defaults(&mut item, scale);
                quiz.items.push(item_id.clone());

                variables
                    .items
                    .insert(item_id.clone(), ItemVariables::for_item(&item, scale));
                variables
                    .quizzes
                    .entry(quiz_id.clone())
                    .or_default()
                    .new_items
                    .push(item_id.clone());
                tables.items.insert(item_id.clone(), item);
            }

            Mutation::CreateDuplicateItem {
                quiz_id,
                source_item_id,
                item_id,
                option_ids,
            } => {
                let source = find(&tables.items, EntityKind::Item, source_item_id)?.clone();
                let options = source
                    .options
                    .iter()
                    .zip(option_ids)
                    .map(|(source_option_id, option_id)| {
                        let mut option =
                            find(&tables.options, EntityKind::Option, source_option_id)?.clone();
                        option.id = option_id.clone();
                        option.quiz_item_id = item_id.clone();
                        option.created_at = None;
                        option.updated_at = None;
                        Ok::<_, MutationError>(option)
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let quiz = find_mut(&mut tables.quizzes, EntityKind::Quiz, quiz_id)?;
                let mut item = source.with_options(option_ids.clone());
                item.id = item_id.clone();
                item.order = quiz.items.len();
                item.created_at = None;
                item.updated_at = None;
                quiz.items.push(item_id.clone());

                for option in options {
                    variables
                        .options
                        .insert(option.id.clone(), OptionVariables::default());
                    tables.options.insert(option.id.clone(), option);
                }
                variables
                    .items
                    .insert(item_id.clone(), ItemVariables::for_item(&item, scale));
                variables
                    .quizzes
                    .entry(quiz_id.clone())
                    .or_default()
                    .new_items
                    .push(item_id.clone());
                tables.items.insert(item_id.clone(), item);
            }

            Mutation::DeleteItem { item_id, quiz_id } => {
                let quiz = find_mut(&mut tables.quizzes, EntityKind::Quiz, quiz_id)?;
                quiz.items.retain(|id| id != item_id);
                let siblings = quiz.items.clone();

                if let Some(item) = tables.items.remove(item_id) {
                    close_gap(&mut tables.items, &siblings, item.order);
                }
                variables.items.remove(item_id);
                if let Some(quiz_variables) = variables.quizzes.get_mut(quiz_id) {
                    quiz_variables.new_items.retain(|id| id != item_id);
                }
            }

            Mutation::MoveItemUp { item_id } | Mutation::MoveItemDown { item_id } => {
                let item = find(&tables.items, EntityKind::Item, item_id)?;
                let siblings = find(&tables.quizzes, EntityKind::Quiz, &item.quiz_id)?
                    .items
                    .clone();
                let up = matches!(self, Mutation::MoveItemUp { .. });
                return Ok(swap_with_neighbour(&mut tables.items, &siblings, item_id, up));
            }

            Mutation::CreateOption { item_id, option_id } => {
                let item = find_mut(&mut tables.items, EntityKind::Item, item_id)?;
                let option = QuizItemOption::new(option_id.clone(), item_id.clone(), item.options.len());
                item.options.push(option_id.clone());

                variables
                    .options
                    .insert(option_id.clone(), OptionVariables::default());
                let item_variables = variables
                    .items
                    .entry(item_id.clone())
                    .or_insert_with(|| ItemVariables::for_item(item, scale));
                item_variables.new_options.push(option_id.clone());
                tables.options.insert(option_id.clone(), option);
            }

            Mutation::DeleteOption { option_id, item_id } => {
                let item = find_mut(&mut tables.items, EntityKind::Item, item_id)?;
                item.options.retain(|id| id != option_id);
                let siblings = item.options.clone();

                if let Some(option) = tables.options.remove(option_id) {
                    close_gap(&mut tables.options, &siblings, option.order);
                }
                variables.options.remove(option_id);
                if let Some(item_variables) = variables.items.get_mut(item_id) {
                    item_variables.new_options.retain(|id| id != option_id);
                }
            }

            Mutation::CreatePeerReviewCollection {
                quiz_id,
                collection_id,
            } => {
                let quiz = find_mut(&mut tables.quizzes, EntityKind::Quiz, quiz_id)?;
                quiz.peer_review_collections.push(collection_id.clone());
                let collection: PeerReviewCollectionRecord =
                    PeerReviewCollection::new(collection_id.clone(), quiz_id.clone());

                variables.peer_review_collections.insert(
                    collection_id.clone(),
                    PeerReviewCollectionVariables::default(),
                );
                variables
                    .quizzes
                    .entry(quiz_id.clone())
                    .or_default()
                    .new_peer_reviews
                    .push(collection_id.clone());
                tables
                    .peer_review_collections
                    .insert(collection_id.clone(), collection);
            }

            Mutation::DeletePeerReviewCollection { collection_id } => {
                if let Some(collection) = tables.peer_review_collections.remove(collection_id) {
                    if let Some(quiz) = tables.quizzes.get_mut(&collection.quiz_id) {
                        quiz.peer_review_collections.retain(|id| id != collection_id);
                    }
                    if let Some(quiz_variables) = variables.quizzes.get_mut(&collection.quiz_id) {
                        quiz_variables.new_peer_reviews.retain(|id| id != collection_id);
                    }
                }
                variables.peer_review_collections.remove(collection_id);
            }

            Mutation::CreateQuestion {
                quiz_id,
                collection_id,
                question_id,
                kind,
            } => {
                let collection = find_mut(
                    &mut tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    collection_id,
                )?;
                let question = PeerReviewQuestion::new(
                    question_id.clone(),
                    quiz_id.clone(),
                    collection_id.clone(),
                    *kind,
                    collection.questions.len(),
                );
                collection.questions.push(question_id.clone());

                variables
                    .questions
                    .insert(question_id.clone(), QuestionVariables::default());
                variables
                    .peer_review_collections
                    .entry(collection_id.clone())
                    .or_default()
                    .new_questions
                    .push(question_id.clone());
                tables.questions.insert(question_id.clone(), question);
            }

            Mutation::DeleteQuestion {
                question_id,
                collection_id,
            } => {
                let collection = find_mut(
                    &mut tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    collection_id,
                )?;
                collection.questions.retain(|id| id != question_id);
                let siblings = collection.questions.clone();

                if let Some(question) = tables.questions.remove(question_id) {
                    close_gap(&mut tables.questions, &siblings, question.order);
                }
                variables.questions.remove(question_id);
                if let Some(collection_variables) =
                    variables.peer_review_collections.get_mut(collection_id)
                {
                    collection_variables.new_questions.retain(|id| id != question_id);
                }
            }

            Mutation::MoveQuestionUp { question_id } | Mutation::MoveQuestionDown { question_id } => {
                let question = find(&tables.questions, EntityKind::Question, question_id)?;
                let siblings = find(
                    &tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    &question.peer_review_collection_id,
                )?
                .questions
                .clone();
                let up = matches!(self, Mutation::MoveQuestionUp { .. });
                return Ok(swap_with_neighbour(
                    &mut tables.questions,
                    &siblings,
                    question_id,
                    up,
                ));
            }

            Mutation::EditQuiz { quiz_id, field } => {
                let quiz = find_mut(&mut tables.quizzes, EntityKind::Quiz, quiz_id)?;
                let quiz_variables = variables.quizzes.entry(quiz_id.clone()).or_default();
                field.clone().apply(quiz, quiz_variables);
            }

            Mutation::EditItem { item_id, field } => {
                let item = find_mut(&mut tables.items, EntityKind::Item, item_id)?;
                let item_variables = variables
                    .items
                    .entry(item_id.clone())
                    .or_insert_with(|| ItemVariables::for_item(item, scale));
                field.clone().apply(item, item_variables);
            }

            Mutation::EditOption { option_id, field } => {
                field
                    .clone()
                    .apply(find_mut(&mut tables.options, EntityKind::Option, option_id)?);
            }

            Mutation::EditPeerReviewCollection {
                collection_id,
                field,
            } => {
                field.clone().apply(find_mut(
                    &mut tables.peer_review_collections,
                    EntityKind::PeerReviewCollection,
                    collection_id,
                )?);
            }

            Mutation::EditQuestion { question_id, field } => {
                field.clone().apply(find_mut(
                    &mut tables.questions,
                    EntityKind::Question,
                    question_id,
                )?);
            }
        }

        Ok(MutationOutcome::Applied)
    }
}

/// Entities ranked by a dense `order` within their sibling group
pub(crate) trait Ordered {
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize);
}

impl Ordered for ItemRecord {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

impl Ordered for QuizItemOption {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

impl Ordered for PeerReviewQuestion {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

/// Shift every sibling ranked after `removed` down by one
fn close_gap<T: Ordered>(table: &mut HashMap<EntityId, T>, siblings: &[EntityId], removed: usize) {
    for id in siblings {
        if let Some(sibling) = table.get_mut(id) {
            if sibling.order() > removed {
                sibling.set_order(sibling.order() - 1);
            }
        }
    }
}

/// Swap `order` with the sibling directly before (`up`) or after it
fn swap_with_neighbour<T: Ordered>(
    table: &mut HashMap<EntityId, T>,
    siblings: &[EntityId],
    id: &str,
    up: bool,
) -> MutationOutcome {
    let Some(current) = table.get(id).map(Ordered::order) else {
        return MutationOutcome::Noop;
    };
    let target = if up {
        current.checked_sub(1)
    } else {
        current.checked_add(1)
    };
    let Some(target) = target else {
        return MutationOutcome::Noop;
    };

    let neighbour = siblings
        .iter()
        .find(|sibling| table.get(sibling.as_str()).map(Ordered::order) == Some(target))
        .cloned();
    let Some(neighbour) = neighbour else {
        return MutationOutcome::Noop;
    };

    if let Some(entity) = table.get_mut(&neighbour) {
        entity.set_order(current);
    }
    if let Some(entity) = table.get_mut(id) {
        entity.set_order(target);
    }
    MutationOutcome::Applied
}

fn apply_kind_defaults(item: &mut ItemRecord, scale: ScaleBounds) {
    let traits = item.kind.traits();
    if traits.uses_scale {
        item.min_value = Some(scale.min);
        item.max_value = Some(scale.max);
    }
    if traits.uses_option_cells {
        item.option_cells = Some(Vec::new());
    }
}

fn find<'a, T>(
    table: &'a HashMap<EntityId, T>,
    kind: EntityKind,
    id: &str,
) -> Result<&'a T, MutationError> {
    table.get(id).ok_or_else(|| MutationError::EntityNotFound {
        kind,
        id: id.to_string(),
    })
}

fn find_mut<'a, T>(
    table: &'a mut HashMap<EntityId, T>,
    kind: EntityKind,
    id: &str,
) -> Result<&'a mut T, MutationError> {
    table.get_mut(id).ok_or_else(|| MutationError::EntityNotFound {
        kind,
        id: id.to_string(),
    })
}

fn fresh<T>(table: &HashMap<EntityId, T>, kind: EntityKind, id: &str) -> Result<(), MutationError> {
    if table.contains_key(id) {
        Err(MutationError::DuplicateId {
            kind,
            id: id.to_string(),
        })
    } else {
        Ok(())
    }
}

fn not_a_child(kind: EntityKind, id: &str, parent: &str) -> MutationError {
    MutationError::NotAChild {
        kind,
        id: id.to_string(),
        parent: parent.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use quiz_common::SequentialIdGenerator;
    use quiz_schema::{ItemDocument, Quiz, QuizDocument};

    fn store(item_count: usize) -> (EntityTables, SessionVariables) {
        let mut quiz: QuizDocument = Quiz::blank("quiz-1".into(), 1, 1);
        quiz.items = (0..item_count)
            .map(|n| {
                let id = format!("item-{}", n);
                let mut item: ItemDocument =
                    QuizItem::new(id.clone(), "quiz-1".into(), ItemKind::MultipleChoice, n);
                item.options = vec![
                    QuizItemOption::new(format!("{}-a", id), id.clone(), 0),
                    QuizItemOption::new(format!("{}-b", id), id, 1),
                ];
                item
            })
            .collect();

        let tables = normalize(quiz).entities;
        let variables = SessionVariables::for_tables(&tables, ScaleBounds::default());
        (tables, variables)
    }

    fn item_orders(tables: &EntityTables) -> Vec<(String, usize)> {
        let mut orders: Vec<_> = tables
            .items
            .values()
            .map(|item| (item.id.clone(), item.order))
            .collect();
        orders.sort();
        orders
    }

    #[test]
    fn test_create_item_appends_with_next_order() {
        let (mut tables, mut variables) = store(2);
        let mut ids = SequentialIdGenerator::new("new");

        let mutation = Mutation::create_item(&mut ids, "quiz-1", ItemKind::Scale);
        let outcome = mutation
            .apply(&mut tables, &mut variables, ScaleBounds::default())
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        let item = &tables.items["new-0"];
        assert_eq!(item.order, 2);
        assert_eq!((item.min_value, item.max_value), (Some(1), Some(7)));
        assert_eq!(tables.quizzes["quiz-1"].items.last().unwrap(), "new-0");
        assert_eq!(variables.quizzes["quiz-1"].new_items, vec!["new-0".to_string()]);
        assert!(variables.items.contains_key("new-0"));
    }

    #[test]
    fn test_move_up_swaps_orders_only() {
        let (mut tables, mut variables) = store(3);

        let outcome = Mutation::MoveItemUp {
            item_id: "item-2".into(),
        }
        .apply(&mut tables, &mut variables, ScaleBounds::default())
        .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(
            item_orders(&tables),
            vec![("item-0".into(), 0), ("item-1".into(), 2), ("item-2".into(), 1)]
        );
        assert_eq!(
            tables.quizzes["quiz-1"].items,
            vec!["item-0".to_string(), "item-1".to_string(), "item-2".to_string()]
        );
    }

    #[test]
    fn test_move_at_boundary_is_noop() {
        let (mut tables, mut variables) = store(3);
        let before = tables.clone();

        let up = Mutation::MoveItemUp {
            item_id: "item-0".into(),
        };
        let down = Mutation::MoveItemDown {
            item_id: "item-2".into(),
        };

        for mutation in [up, down] {
            let outcome = mutation
                .apply(&mut tables, &mut variables, ScaleBounds::default())
                .unwrap();
            assert_eq!(outcome, MutationOutcome::Noop);
        }
        assert_eq!(tables, before);
    }

    #[test]
    fn test_delete_option_closes_gap() {
        let (mut tables, mut variables) = store(1);
        let mut ids = SequentialIdGenerator::new("opt");
        Mutation::create_option(&mut ids, "item-0")
            .apply(&mut tables, &mut variables, ScaleBounds::default())
            .unwrap();

        Mutation::DeleteOption {
            option_id: "item-0-a".into(),
            item_id: "item-0".into(),
        }
        .apply(&mut tables, &mut variables, ScaleBounds::default())
        .unwrap();

        assert_eq!(tables.options["item-0-b"].order, 0);
        assert_eq!(tables.options["opt-0"].order, 1);
        assert!(!variables.options.contains_key("item-0-a"));
        assert_eq!(variables.items["item-0"].new_options, vec!["opt-0".to_string()]);
    }

    #[test]
    fn test_failed_validation_leaves_store_untouched() {
        let (mut tables, mut variables) = store(2);
        let before = (tables.clone(), variables.clone());

        let err = Mutation::DeleteOption {
            option_id: "item-0-a".into(),
            item_id: "item-1".into(),
        }
        .apply(&mut tables, &mut variables, ScaleBounds::default())
        .unwrap_err();

        assert!(matches!(err, MutationError::NotAChild { .. }));
        assert_eq!((tables, variables), before);
    }

    #[test]
    fn test_options_rejected_for_essay_items() {
        let (mut tables, _) = store(1);
        tables.items.get_mut("item-0").unwrap().kind = ItemKind::Essay;

        let err = Mutation::CreateOption {
            item_id: "item-0".into(),
            option_id: "opt-0".into(),
        }
        .validate(&tables)
        .unwrap_err();

        assert_eq!(
            err,
            MutationError::UnsupportedForKind {
                kind: ItemKind::Essay,
                operation: "options"
            }
        );
    }

    #[test]
    fn test_duplicate_needs_one_id_per_option() {
        let (tables, _) = store(1);

        let err = Mutation::CreateDuplicateItem {
            quiz_id: "quiz-1".into(),
            source_item_id: "item-0".into(),
            item_id: "copy".into(),
            option_ids: vec!["copy-a".into()],
        }
        .validate(&tables)
        .unwrap_err();

        assert!(matches!(err, MutationError::InvalidMutation(_)));
    }

    #[test]
    fn test_move_down_at_largest_order_is_noop() {
        let (mut tables, mut variables) = store(1);
        tables.items.get_mut("item-0").unwrap().order = usize::MAX;

        let outcome = Mutation::MoveItemDown {
            item_id: "item-0".into(),
        }
        .apply(&mut tables, &mut variables, ScaleBounds::default())
        .unwrap();

        assert_eq!(outcome, MutationOutcome::Noop);
        assert_eq!(tables.items["item-0"].order, usize::MAX);
    }

    #[test]
    fn test_duplicate_gets_fresh_timestamps() {
        let (mut tables, mut variables) = store(1);
        let stamp = Some(chrono::Utc::now());
        for option in tables.options.values_mut() {
            option.created_at = stamp;
            option.updated_at = stamp;
        }
        let source = tables.items.get_mut("item-0").unwrap();
        source.created_at = stamp;
        source.updated_at = stamp;

        let mut ids = SequentialIdGenerator::new("copy");
        Mutation::create_duplicate_item(&mut ids, &tables, "quiz-1", "item-0")
            .unwrap()
            .apply(&mut tables, &mut variables, ScaleBounds::default())
            .unwrap();

        let copy = &tables.items["copy-0"];
        assert_eq!((copy.created_at, copy.updated_at), (None, None));
        for option_id in &copy.options {
            let option = &tables.options[option_id];
            assert_eq!((option.created_at, option.updated_at), (None, None));
        }
        assert_eq!(tables.items["item-0"].created_at, stamp);
    }

    #[test]
    fn test_missing_entity_is_reported_by_kind() {
        let (tables, _) = store(0);

        let err = Mutation::MoveQuestionDown {
            question_id: "q-9".into(),
        }
        .validate(&tables)
        .unwrap_err();

        assert_eq!(
            err,
            MutationError::EntityNotFound {
                kind: EntityKind::Question,
                id: "q-9".into()
            }
        );
        assert_eq!(err.to_string(), "question not found: q-9");
    }
}

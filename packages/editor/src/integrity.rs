//! Structural checks over a quiz store.
//!
//! `check_references` covers parent/child links and the one-to-one match
//! between entities and their session state. `check_ordering` covers dense
//! `order` within each sibling group.

use crate::mutations::Ordered;
use crate::variables::SessionVariables;
use quiz_schema::{EntityId, EntityKind, EntityTables};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("Root quiz not found: {0}")]
    MissingRoot(EntityId),

    #[error("{parent} lists missing {kind} {id}")]
    DanglingReference {
        kind: EntityKind,
        id: EntityId,
        parent: EntityId,
    },

    #[error("{kind} {id} is not listed by any parent")]
    Orphan { kind: EntityKind, id: EntityId },

    #[error("{kind} {id} is listed more than once")]
    DuplicateReference { kind: EntityKind, id: EntityId },

    #[error("{kind} {id} is listed by {listed_by} but points at {points_at}")]
    WrongParent {
        kind: EntityKind,
        id: EntityId,
        listed_by: EntityId,
        points_at: EntityId,
    },

    #[error("{kind} order under {parent} is not dense: {orders:?}")]
    NonDenseOrder {
        kind: EntityKind,
        parent: EntityId,
        orders: Vec<usize>,
    },

    #[error("No session state for {kind} {id}")]
    MissingSessionState { kind: EntityKind, id: EntityId },

    #[error("Session state left behind for deleted {kind} {id}")]
    StaleSessionState { kind: EntityKind, id: EntityId },
}

/// Every listed child exists, points back at its lister, and is listed once
pub fn check_references(
    tables: &EntityTables,
    root: &str,
    variables: &SessionVariables,
) -> Result<(), IntegrityError> {
    if !tables.quizzes.contains_key(root) {
        return Err(IntegrityError::MissingRoot(root.to_string()));
    }

    check_edges(
        &tables.quizzes,
        &tables.items,
        EntityKind::Item,
        |quiz| &quiz.items,
        |item| &item.quiz_id,
    )?;
    check_edges(
        &tables.items,
        &tables.options,
        EntityKind::Option,
        |item| &item.options,
        |option| &option.quiz_item_id,
    )?;
    check_edges(
        &tables.quizzes,
        &tables.peer_review_collections,
        EntityKind::PeerReviewCollection,
        |quiz| &quiz.peer_review_collections,
        |collection| &collection.quiz_id,
    )?;
    check_edges(
        &tables.peer_review_collections,
        &tables.questions,
        EntityKind::Question,
        |collection| &collection.questions,
        |question| &question.peer_review_collection_id,
    )?;

    check_session_state(tables, variables)
}

fn check_edges<P, C>(
    parents: &HashMap<EntityId, P>,
    children: &HashMap<EntityId, C>,
    kind: EntityKind,
    child_ids: impl Fn(&P) -> &Vec<EntityId>,
    parent_of: impl Fn(&C) -> &EntityId,
) -> Result<(), IntegrityError> {
    let mut listed = HashSet::new();

    for (parent_id, parent) in parents {
        for id in child_ids(parent) {
            let child = children
                .get(id)
                .ok_or_else(|| IntegrityError::DanglingReference {
                    kind,
                    id: id.clone(),
                    parent: parent_id.clone(),
                })?;
            if parent_of(child) != parent_id {
                return Err(IntegrityError::WrongParent {
                    kind,
                    id: id.clone(),
                    listed_by: parent_id.clone(),
                    points_at: parent_of(child).clone(),
                });
            }
            if !listed.insert(id) {
                return Err(IntegrityError::DuplicateReference {
                    kind,
                    id: id.clone(),
                });
            }
        }
    }

    match children.keys().find(|id| !listed.contains(id)) {
        Some(id) => Err(IntegrityError::Orphan {
            kind,
            id: id.clone(),
        }),
        None => Ok(()),
    }
}

fn check_session_state(
    tables: &EntityTables,
    variables: &SessionVariables,
) -> Result<(), IntegrityError> {
    for kind in EntityKind::ALL {
        if let Some(id) = tables.ids(kind).into_iter().find(|id| !variables.contains(kind, id)) {
            return Err(IntegrityError::MissingSessionState {
                kind,
                id: id.clone(),
            });
        }
        if let Some(id) = variables.ids(kind).into_iter().find(|id| !tables.contains(kind, id)) {
            return Err(IntegrityError::StaleSessionState {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

/// `order` in every sibling group is a permutation of `0..n`
pub fn check_ordering(tables: &EntityTables) -> Result<(), IntegrityError> {
    for quiz in tables.quizzes.values() {
        check_dense(&tables.items, EntityKind::Item, &quiz.id, &quiz.items)?;
    }
    for item in tables.items.values() {
        check_dense(&tables.options, EntityKind::Option, &item.id, &item.options)?;
    }
    for collection in tables.peer_review_collections.values() {
        check_dense(
            &tables.questions,
            EntityKind::Question,
            &collection.id,
            &collection.questions,
        )?;
    }
    Ok(())
}

fn check_dense<T: Ordered>(
    table: &HashMap<EntityId, T>,
    kind: EntityKind,
    parent: &str,
    siblings: &[EntityId],
) -> Result<(), IntegrityError> {
    let mut orders: Vec<usize> = siblings
        .iter()
        .filter_map(|id| table.get(id).map(Ordered::order))
        .collect();
    orders.sort_unstable();

    if orders.iter().copied().eq(0..siblings.len()) {
        Ok(())
    } else {
        Err(IntegrityError::NonDenseOrder {
            kind,
            parent: parent.to_string(),
            orders,
        })
    }
}

use crate::entities::{
    EntityId, ItemRecord, PeerReviewCollectionRecord, PeerReviewQuestion, QuizItemOption,
    QuizRecord,
};
use crate::kinds::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat entity tables, one map per entity kind keyed by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTables {
    #[serde(default)]
    pub quizzes: HashMap<EntityId, QuizRecord>,
    #[serde(default)]
    pub items: HashMap<EntityId, ItemRecord>,
    #[serde(default)]
    pub options: HashMap<EntityId, QuizItemOption>,
    #[serde(default)]
    pub peer_review_collections: HashMap<EntityId, PeerReviewCollectionRecord>,
    #[serde(default)]
    pub questions: HashMap<EntityId, PeerReviewQuestion>,
}

impl EntityTables {
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Quiz => self.quizzes.contains_key(id),
            EntityKind::Item => self.items.contains_key(id),
            EntityKind::Option => self.options.contains_key(id),
            EntityKind::PeerReviewCollection => self.peer_review_collections.contains_key(id),
            EntityKind::Question => self.questions.contains_key(id),
        }
    }

    /// Ids of every entity of one kind, in no particular order
    pub fn ids(&self, kind: EntityKind) -> Vec<&EntityId> {
        match kind {
            EntityKind::Quiz => self.quizzes.keys().collect(),
            EntityKind::Item => self.items.keys().collect(),
            EntityKind::Option => self.options.keys().collect(),
            EntityKind::PeerReviewCollection => self.peer_review_collections.keys().collect(),
            EntityKind::Question => self.questions.keys().collect(),
        }
    }

    /// Total number of entities across all tables
    pub fn len(&self) -> usize {
        self.quizzes.len()
            + self.items.len()
            + self.options.len()
            + self.peer_review_collections.len()
            + self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of normalization: the tables plus the root quiz id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub entities: EntityTables,
    pub result: EntityId,
}

//! # Post-Effect System
//!
//! Deleting a container has to take its children with it. Post-effects
//! inspect a primary mutation against the current tables and emit the
//! secondary mutations that keep the store consistent:
//! - Deleting an item → delete each of its options
//! - Deleting a peer-review collection → delete each of its questions
//!
//! Secondary mutations run before the primary one, so the primary sees a
//! container with no children left.

use crate::mutations::{Mutation, MutationError, MutationOutcome};
use crate::variables::{ScaleBounds, SessionVariables};
use quiz_schema::EntityTables;
use tracing::debug;

/// Post-effect that can be triggered by a mutation
pub trait PostEffect: std::fmt::Debug + Send {
    /// Analyze the mutation and generate secondary mutations if needed
    fn analyze(&self, mutation: &Mutation, tables: &EntityTables) -> Vec<Mutation>;
}

/// Delete the options of a deleted item
#[derive(Debug)]
pub struct CascadeItemOptions;

impl PostEffect for CascadeItemOptions {
    fn analyze(&self, mutation: &Mutation, tables: &EntityTables) -> Vec<Mutation> {
        let Mutation::DeleteItem { item_id, .. } = mutation else {
            return vec![];
        };

        tables
            .items
            .get(item_id)
            .map(|item| {
                item.options
                    .iter()
                    .map(|option_id| Mutation::DeleteOption {
                        option_id: option_id.clone(),
                        item_id: item_id.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Delete the questions of a deleted peer-review collection
#[derive(Debug)]
pub struct CascadeCollectionQuestions;

impl PostEffect for CascadeCollectionQuestions {
    fn analyze(&self, mutation: &Mutation, tables: &EntityTables) -> Vec<Mutation> {
        let Mutation::DeletePeerReviewCollection { collection_id } = mutation else {
            return vec![];
        };

        tables
            .peer_review_collections
            .get(collection_id)
            .map(|collection| {
                collection
                    .questions
                    .iter()
                    .map(|question_id| Mutation::DeleteQuestion {
                        question_id: question_id.clone(),
                        collection_id: collection_id.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(CascadeItemOptions), Box::new(CascadeCollectionQuestions)],
        }
    }

    /// Analyze a mutation and generate all secondary mutations
    pub fn analyze(&self, mutation: &Mutation, tables: &EntityTables) -> Vec<Mutation> {
        self.effects
            .iter()
            .flat_map(|effect| effect.analyze(mutation, tables))
            .collect()
    }

    /// Apply a mutation with all its post-effects.
    ///
    /// Returns the outcome of the primary mutation and every mutation that
    /// was applied, secondaries first.
    pub(crate) fn apply_with_effects(
        &self,
        mutation: Mutation,
        tables: &mut EntityTables,
        variables: &mut SessionVariables,
        scale: ScaleBounds,
    ) -> Result<(MutationOutcome, Vec<Mutation>), MutationError> {
        // Reject before any cascade runs
        mutation.validate(tables)?;

        let secondary = self.analyze(&mutation, tables);
        if !secondary.is_empty() {
            debug!(count = secondary.len(), "Applying cascade");
        }

        let mut applied = Vec::with_capacity(secondary.len() + 1);
        for secondary_mutation in secondary {
            secondary_mutation.apply(tables, variables, scale)?;
            applied.push(secondary_mutation);
        }

        let outcome = mutation.apply(tables, variables, scale)?;
        applied.push(mutation);

        Ok((outcome, applied))
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

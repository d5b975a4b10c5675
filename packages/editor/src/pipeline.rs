//! # Editing Pipeline
//!
//! Coordinates one edit cycle: Mutate → Verify → Denormalize
//!
//! The Pipeline manages:
//! - Applying mutations (with cascades)
//! - Checking references after each change
//! - Rebuilding the host document
//! - Caching the last document sent out

use crate::{EditorError, EditorState, Mutation, MutationOutcome, UiCommand};
use quiz_schema::QuizDocument;
use tracing::error;

/// Manages the full edit → sync pipeline
#[derive(Debug)]
pub struct Pipeline {
    state: EditorState,
    verify_references: bool,
    last_document: Option<QuizDocument>,
}

impl Pipeline {
    /// Create pipeline for a store
    pub fn new(state: EditorState, verify_references: bool) -> Self {
        Self {
            state,
            verify_references,
            last_document: None,
        }
    }

    /// Apply mutation and get the document to sync
    ///
    /// This:
    /// 1. Applies the mutation
    /// 2. Checks references and session state (if enabled)
    /// 3. Denormalizes the tables
    /// 4. Returns the document, or none for a no-op
    pub fn apply_mutation(&mut self, mutation: Mutation) -> Result<PipelineResult, EditorError> {
        // 1. Apply mutation
        let mutation_result = self.state.apply(mutation)?;

        if mutation_result.outcome == MutationOutcome::Noop {
            return Ok(PipelineResult {
                version: mutation_result.version,
                outcome: mutation_result.outcome,
                document: None,
                valid: self.state.is_valid(),
            });
        }

        // 2. Verify
        if self.verify_references {
            self.state.check_references().inspect_err(|e| {
                error!(error = %e, version = mutation_result.version, "Store failed reference check");
            })?;
        }

        // 3. Denormalize
        let document = self.state.to_document()?;

        // 4. Update cached document
        self.last_document = Some(document.clone());

        Ok(PipelineResult {
            version: mutation_result.version,
            outcome: mutation_result.outcome,
            document: Some(document),
            valid: self.state.is_valid(),
        })
    }

    /// Session-state edit; nothing to sync
    pub fn apply_ui(&mut self, command: UiCommand) -> Result<(), EditorError> {
        self.state.apply_ui(command)
    }

    /// Full rebuild (for recovery/debugging)
    pub fn full_snapshot(&mut self) -> Result<QuizDocument, EditorError> {
        let document = self.state.to_document()?;
        self.last_document = Some(document.clone());
        Ok(document)
    }

    /// Get current store
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Get last document (if any)
    pub fn last_document(&self) -> Option<&QuizDocument> {
        self.last_document.as_ref()
    }

    /// Clear document cache
    pub fn clear_cache(&mut self) {
        self.last_document = None;
    }
}

/// Result of pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// New version number
    pub version: u64,

    pub outcome: MutationOutcome,

    /// Document to send to the host; none when nothing changed
    pub document: Option<QuizDocument>,

    /// Whether the host may accept the document
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemField, ScaleBounds};
    use quiz_schema::{ItemKind, Quiz};

    fn pipeline() -> Pipeline {
        let state =
            EditorState::from_document(Quiz::blank("quiz-1".into(), 1, 1), ScaleBounds::default());
        Pipeline::new(state, true)
    }

    #[test]
    fn test_pipeline_initial_snapshot() {
        let mut pipeline = pipeline();

        let document = pipeline.full_snapshot().unwrap();
        assert_eq!(document.id, "quiz-1");

        // Should have cached document
        assert!(pipeline.last_document().is_some());
        pipeline.clear_cache();
        assert!(pipeline.last_document().is_none());
    }

    #[test]
    fn test_pipeline_mutation_returns_document() {
        let mut pipeline = pipeline();

        let result = pipeline
            .apply_mutation(Mutation::CreateItem {
                quiz_id: "quiz-1".into(),
                item_id: "item-1".into(),
                kind: ItemKind::Open,
            })
            .unwrap();

        assert_eq!(result.version, 1);
        assert!(result.valid);
        let document = result.document.unwrap();
        assert_eq!(document.items[0].id, "item-1");
        assert_eq!(pipeline.last_document(), Some(&document));
    }

    #[test]
    fn test_noop_returns_no_document() {
        let mut pipeline = pipeline();
        pipeline
            .apply_mutation(Mutation::CreateItem {
                quiz_id: "quiz-1".into(),
                item_id: "item-1".into(),
                kind: ItemKind::Open,
            })
            .unwrap();

        let result = pipeline
            .apply_mutation(Mutation::MoveItemDown {
                item_id: "item-1".into(),
            })
            .unwrap();

        assert_eq!(result.outcome, MutationOutcome::Noop);
        assert!(result.document.is_none());
    }

    #[test]
    fn test_invalid_regex_marks_result_invalid() {
        let mut pipeline = pipeline();
        pipeline
            .apply_mutation(Mutation::CreateItem {
                quiz_id: "quiz-1".into(),
                item_id: "item-1".into(),
                kind: ItemKind::Open,
            })
            .unwrap();

        let result = pipeline
            .apply_mutation(Mutation::EditItem {
                item_id: "item-1".into(),
                field: ItemField::ValidityRegex("[".into()),
            })
            .unwrap();

        assert!(!result.valid);
        assert_eq!(result.document.unwrap().items[0].validity_regex, None);
    }
}

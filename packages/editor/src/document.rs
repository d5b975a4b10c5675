//! # Editor State
//!
//! The normalized quiz store for one editing session: flat entity tables,
//! the root quiz id, and the per-entity session state that lives and dies
//! with each entity.
//!
//! ## Lifecycle
//!
//! ```text
//! Host doc → Normalize → Mutate* → Denormalize → Host doc
//!              ↓            ↓            ↓
//!           tables     tables+vars    snapshot
//! ```

use crate::denormalize::denormalize;
use crate::integrity::{check_ordering, check_references, IntegrityError};
use crate::mutations::{Mutation, MutationError, MutationOutcome};
use crate::normalize::normalize;
use crate::post_effects::PostEffectEngine;
use crate::variables::{ScaleBounds, SessionVariables, UiCommand};
use crate::EditorError;
use quiz_schema::{EntityId, EntityKind, EntityTables, Normalized, QuizDocument};
use tracing::{debug, warn};

/// Editable quiz store
#[derive(Debug)]
pub struct EditorState {
    /// Current version number (increments on each applied mutation)
    pub version: u64,

    root: EntityId,
    tables: EntityTables,
    variables: SessionVariables,
    scale: ScaleBounds,
    effects: PostEffectEngine,
}

/// Result of applying one mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub version: u64,
    pub outcome: MutationOutcome,
    /// Cascaded mutations first, then the requested one
    pub applied: Vec<Mutation>,
}

impl EditorState {
    /// Take ownership of normalized tables and seed session state for them
    pub fn from_normalized(normalized: Normalized, scale: ScaleBounds) -> Self {
        let Normalized { entities, result } = normalized;

        // Host documents are taken as-is
        if let Err(e) = check_ordering(&entities) {
            warn!(error = %e, "Quiz document arrived with inconsistent ordering");
        }

        let variables = SessionVariables::for_tables(&entities, scale);
        Self {
            version: 0,
            root: result,
            tables: entities,
            variables,
            scale,
            effects: PostEffectEngine::new(),
        }
    }

    pub fn from_document(doc: QuizDocument, scale: ScaleBounds) -> Self {
        Self::from_normalized(normalize(doc), scale)
    }

    pub fn root(&self) -> &EntityId {
        &self.root
    }

    pub fn tables(&self) -> &EntityTables {
        &self.tables
    }

    pub fn variables(&self) -> &SessionVariables {
        &self.variables
    }

    /// Apply a mutation and its cascades
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        let (kind, id) = mutation.target();
        debug!(kind = %kind, id = %id, "Applying mutation");

        let (outcome, applied) = self.effects.apply_with_effects(
            mutation,
            &mut self.tables,
            &mut self.variables,
            self.scale,
        )?;

        if outcome == MutationOutcome::Applied {
            self.version += 1;
        }

        Ok(MutationResult {
            version: self.version,
            outcome,
            applied,
        })
    }

    /// Edit session state only; the quiz document is untouched
    pub fn apply_ui(&mut self, command: UiCommand) -> Result<(), EditorError> {
        let variables = &mut self.variables;
        match command {
            UiCommand::SetAdvancedEditing { item_id, open } => {
                item_state(variables, &item_id)?.advanced_editing = open;
            }
            UiCommand::SetTestingRegex { item_id, testing } => {
                item_state(variables, &item_id)?.testing_regex = testing;
            }
            UiCommand::SetTestingFormatRegex { item_id, testing } => {
                item_state(variables, &item_id)?.testing_format_regex = testing;
            }
            UiCommand::SetValidityRegexTestAnswer { item_id, answer } => {
                item_state(variables, &item_id)?.validity_regex_test_answer = answer;
            }
            UiCommand::SetFormatRegexTestAnswer { item_id, answer } => {
                item_state(variables, &item_id)?.format_regex_test_answer = answer;
            }
            UiCommand::SetAddingNewItem {
                quiz_id,
                adding,
                kind,
            } => {
                let quiz = variables
                    .quizzes
                    .get_mut(&quiz_id)
                    .ok_or_else(|| not_found(EntityKind::Quiz, &quiz_id))?;
                quiz.adding_new_item = adding;
                quiz.new_item_type = kind;
            }
            UiCommand::SetOptionEditing { option_id, editing } => {
                variables
                    .options
                    .get_mut(&option_id)
                    .ok_or_else(|| not_found(EntityKind::Option, &option_id))?
                    .option_editing = editing;
            }
            UiCommand::SetQuestionEditing {
                question_id,
                editing,
            } => {
                variables
                    .questions
                    .get_mut(&question_id)
                    .ok_or_else(|| not_found(EntityKind::Question, &question_id))?
                    .editing = editing;
            }
        }
        Ok(())
    }

    /// Rebuild the nested document for the host
    pub fn to_document(&self) -> Result<QuizDocument, EditorError> {
        Ok(denormalize(&self.tables, &self.root)?)
    }

    pub fn normalized(&self) -> Normalized {
        Normalized {
            entities: self.tables.clone(),
            result: self.root.clone(),
        }
    }

    pub fn check_references(&self) -> Result<(), IntegrityError> {
        check_references(&self.tables, &self.root, &self.variables)
    }

    pub fn check_ordering(&self) -> Result<(), IntegrityError> {
        check_ordering(&self.tables)
    }

    pub fn verify(&self) -> Result<(), IntegrityError> {
        self.check_references()?;
        self.check_ordering()
    }

    /// Whether the host may accept the current document
    pub fn is_valid(&self) -> bool {
        self.variables.is_valid()
    }

    pub(crate) fn mark_new_quiz(&mut self) {
        if let Some(quiz) = self.variables.quizzes.get_mut(&self.root) {
            quiz.new_quiz = true;
        }
    }
}

fn item_state<'a>(
    variables: &'a mut SessionVariables,
    item_id: &str,
) -> Result<&'a mut crate::variables::ItemVariables, MutationError> {
    variables
        .items
        .get_mut(item_id)
        .ok_or_else(|| not_found(EntityKind::Item, item_id))
}

fn not_found(kind: EntityKind, id: &str) -> MutationError {
    MutationError::EntityNotFound {
        kind,
        id: id.to_string(),
    }
}

//! # Edit Session Management
//!
//! An EditSession is one editor frame's view of one quiz. It owns the id
//! generator, the editing pipeline and the host-selected language. The
//! host can replace the quiz at any time; a bootstrap discards the
//! previous store entirely.

use crate::{
    EditorError, EditorState, ItemField, Mutation, OptionField, PeerReviewCollectionField,
    Pipeline, PipelineResult, QuestionField, QuizField, ScaleBounds, UiCommand,
};
use quiz_common::{EditorConfig, IdGenerator, UuidGenerator};
use quiz_schema::{EntityId, EntityKind, ItemKind, QuestionKind, Quiz, QuizDocument};
use std::path::Path;
use tracing::{info, instrument};

/// Single editing session
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    config: EditorConfig,
    ids: Box<dyn IdGenerator>,
    pipeline: Option<Pipeline>,
    language: Option<String>,
}

impl EditSession {
    /// Create session with random ids
    pub fn new(config: EditorConfig) -> Self {
        Self::with_id_generator(config, Box::new(UuidGenerator))
    }

    /// Create session configured from `quiz-editor.config.json` in `dir`
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        Ok(Self::new(EditorConfig::load(dir)?))
    }

    pub fn with_id_generator(config: EditorConfig, mut ids: Box<dyn IdGenerator>) -> Self {
        Self {
            id: ids.next_id(),
            config,
            ids,
            pipeline: None,
            language: None,
        }
    }

    /// Replace the store with a host document, or a blank quiz for `None`
    #[instrument(skip(self, document), fields(session_id = %self.id))]
    pub fn bootstrap(&mut self, document: Option<QuizDocument>) {
        let scale = ScaleBounds {
            min: self.config.scale_min,
            max: self.config.scale_max,
        };

        let state = match document {
            Some(document) => EditorState::from_document(document, scale),
            None => {
                let blank: QuizDocument = Quiz::blank(
                    self.ids.next_id(),
                    self.config.default_tries,
                    self.config.default_points,
                );
                let mut state = EditorState::from_document(blank, scale);
                state.mark_new_quiz();
                state
            }
        };

        info!(
            quiz_id = %state.root(),
            items = state.tables().items.len(),
            "Editing session bootstrapped"
        );
        self.pipeline = Some(Pipeline::new(state, self.config.verify_after_mutation));
    }

    /// Drop the current quiz; edits fail until the next bootstrap
    pub fn reset(&mut self) {
        if self.pipeline.take().is_some() {
            info!(session_id = %self.id, "Editing session reset");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn state(&self) -> Result<&EditorState, EditorError> {
        self.pipeline
            .as_ref()
            .map(Pipeline::state)
            .ok_or(EditorError::NotInitialized)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }

    /// Apply any mutation through the pipeline
    pub fn apply(&mut self, mutation: Mutation) -> Result<PipelineResult, EditorError> {
        self.pipeline_mut()?.apply_mutation(mutation)
    }

    pub fn apply_ui(&mut self, command: UiCommand) -> Result<(), EditorError> {
        self.pipeline_mut()?.apply_ui(command)
    }

    /// Current document, rebuilt from the store
    pub fn snapshot(&mut self) -> Result<QuizDocument, EditorError> {
        self.pipeline_mut()?.full_snapshot()
    }

    pub fn create_item(&mut self, kind: ItemKind) -> Result<PipelineResult, EditorError> {
        let root = self.root()?;
        let mutation = Mutation::create_item(self.ids.as_mut(), &root, kind);
        self.apply(mutation)
    }

    pub fn duplicate_item(&mut self, item_id: &str) -> Result<PipelineResult, EditorError> {
        let root = self.root()?;
        let pipeline = self.pipeline.as_mut().ok_or(EditorError::NotInitialized)?;
        let mutation = Mutation::create_duplicate_item(
            self.ids.as_mut(),
            pipeline.state().tables(),
            &root,
            item_id,
        )?;
        pipeline.apply_mutation(mutation)
    }

    pub fn delete_item(&mut self, item_id: &str) -> Result<PipelineResult, EditorError> {
        let quiz_id = self.root()?;
        self.apply(Mutation::DeleteItem {
            item_id: item_id.to_string(),
            quiz_id,
        })
    }

    pub fn move_item_up(&mut self, item_id: &str) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::MoveItemUp {
            item_id: item_id.to_string(),
        })
    }

    pub fn move_item_down(&mut self, item_id: &str) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::MoveItemDown {
            item_id: item_id.to_string(),
        })
    }

    pub fn create_option(&mut self, item_id: &str) -> Result<PipelineResult, EditorError> {
        let mutation = Mutation::create_option(self.ids.as_mut(), item_id);
        self.apply(mutation)
    }

    pub fn delete_option(&mut self, option_id: &str) -> Result<PipelineResult, EditorError> {
        let item_id = self
            .state()?
            .tables()
            .options
            .get(option_id)
            .map(|option| option.quiz_item_id.clone())
            .ok_or_else(|| not_found(EntityKind::Option, option_id))?;

        self.apply(Mutation::DeleteOption {
            option_id: option_id.to_string(),
            item_id,
        })
    }

    pub fn create_peer_review_collection(&mut self) -> Result<PipelineResult, EditorError> {
        let root = self.root()?;
        let mutation = Mutation::create_peer_review_collection(self.ids.as_mut(), &root);
        self.apply(mutation)
    }

    pub fn delete_peer_review_collection(
        &mut self,
        collection_id: &str,
    ) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::DeletePeerReviewCollection {
            collection_id: collection_id.to_string(),
        })
    }

    pub fn create_question(
        &mut self,
        collection_id: &str,
        kind: QuestionKind,
    ) -> Result<PipelineResult, EditorError> {
        let root = self.root()?;
        let mutation = Mutation::create_question(self.ids.as_mut(), &root, collection_id, kind);
        self.apply(mutation)
    }

    pub fn delete_question(&mut self, question_id: &str) -> Result<PipelineResult, EditorError> {
        let collection_id = self
            .state()?
            .tables()
            .questions
            .get(question_id)
            .map(|question| question.peer_review_collection_id.clone())
            .ok_or_else(|| not_found(EntityKind::Question, question_id))?;

        self.apply(Mutation::DeleteQuestion {
            question_id: question_id.to_string(),
            collection_id,
        })
    }

    pub fn move_question_up(&mut self, question_id: &str) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::MoveQuestionUp {
            question_id: question_id.to_string(),
        })
    }

    pub fn move_question_down(&mut self, question_id: &str) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::MoveQuestionDown {
            question_id: question_id.to_string(),
        })
    }

    pub fn edit_quiz(&mut self, field: QuizField) -> Result<PipelineResult, EditorError> {
        let quiz_id = self.root()?;
        self.apply(Mutation::EditQuiz { quiz_id, field })
    }

    pub fn edit_item(&mut self, item_id: &str, field: ItemField) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::EditItem {
            item_id: item_id.to_string(),
            field,
        })
    }

    pub fn edit_option(
        &mut self,
        option_id: &str,
        field: OptionField,
    ) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::EditOption {
            option_id: option_id.to_string(),
            field,
        })
    }

    pub fn edit_peer_review_collection(
        &mut self,
        collection_id: &str,
        field: PeerReviewCollectionField,
    ) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::EditPeerReviewCollection {
            collection_id: collection_id.to_string(),
            field,
        })
    }

    pub fn edit_question(
        &mut self,
        question_id: &str,
        field: QuestionField,
    ) -> Result<PipelineResult, EditorError> {
        self.apply(Mutation::EditQuestion {
            question_id: question_id.to_string(),
            field,
        })
    }

    fn root(&self) -> Result<EntityId, EditorError> {
        Ok(self.state()?.root().clone())
    }

    fn pipeline_mut(&mut self) -> Result<&mut Pipeline, EditorError> {
        self.pipeline.as_mut().ok_or(EditorError::NotInitialized)
    }
}

fn not_found(kind: EntityKind, id: &str) -> EditorError {
    crate::MutationError::EntityNotFound {
        kind,
        id: id.to_string(),
    }
    .into()
}

//! # Quiz Schema
//!
//! Shapes of the quiz entities and their containment relationships, in
//! both the nested document form exchanged with the host page and the
//! flat form the editor works on.

mod entities;
mod kinds;
mod tables;

pub use entities::{
    EntityId, ExtraFields, ItemDocument, ItemRecord, PeerReviewCollection, PeerReviewCollectionDocument,
    PeerReviewCollectionRecord, PeerReviewQuestion, Quiz, QuizDocument, QuizItem, QuizItemOption,
    QuizRecord,
};
pub use kinds::{
    Direction, EntityKind, FeedbackDisplayPolicy, GradingPolicy, GrantPointsPolicy, ItemKind,
    ItemTraits, QuestionKind,
};
pub use tables::{EntityTables, Normalized};

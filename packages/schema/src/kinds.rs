//! Closed vocabularies used by quiz entities.
//!
//! Every `type` tag the host sends is parsed into one of these enums at the
//! serde boundary, so the rest of the editor matches on variants instead of
//! comparing strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five addressable entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Quiz,
    Item,
    Option,
    PeerReviewCollection,
    Question,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Quiz,
        EntityKind::Item,
        EntityKind::Option,
        EntityKind::PeerReviewCollection,
        EntityKind::Question,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Quiz => "quiz",
            EntityKind::Item => "item",
            EntityKind::Option => "option",
            EntityKind::PeerReviewCollection => "peer review collection",
            EntityKind::Question => "question",
        };
        f.write_str(name)
    }
}

/// Quiz item type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    MultipleChoice,
    Checkbox,
    Essay,
    Open,
    Scale,
    Matrix,
    CustomFrontend,
    MultipleChoiceDropdown,
    ClickableMultipleChoice,
}

/// Which type-specific fields an item kind makes use of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemTraits {
    pub has_options: bool,
    pub uses_regex: bool,
    pub uses_word_limits: bool,
    pub uses_scale: bool,
    pub uses_option_cells: bool,
}

impl ItemKind {
    pub const ALL: [ItemKind; 9] = [
        ItemKind::MultipleChoice,
        ItemKind::Checkbox,
        ItemKind::Essay,
        ItemKind::Open,
        ItemKind::Scale,
        ItemKind::Matrix,
        ItemKind::CustomFrontend,
        ItemKind::MultipleChoiceDropdown,
        ItemKind::ClickableMultipleChoice,
    ];

    /// Single dispatch point for kind-specific behavior
    pub fn traits(self) -> ItemTraits {
        match self {
            ItemKind::MultipleChoice
            | ItemKind::MultipleChoiceDropdown
            | ItemKind::ClickableMultipleChoice => ItemTraits {
                has_options: true,
                ..ItemTraits::default()
            },
            ItemKind::Open => ItemTraits {
                uses_regex: true,
                ..ItemTraits::default()
            },
            ItemKind::Essay => ItemTraits {
                uses_word_limits: true,
                ..ItemTraits::default()
            },
            ItemKind::Scale => ItemTraits {
                uses_scale: true,
                ..ItemTraits::default()
            },
            ItemKind::Matrix => ItemTraits {
                uses_option_cells: true,
                ..ItemTraits::default()
            },
            ItemKind::Checkbox | ItemKind::CustomFrontend => ItemTraits::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::MultipleChoice => "multiple-choice",
            ItemKind::Checkbox => "checkbox",
            ItemKind::Essay => "essay",
            ItemKind::Open => "open",
            ItemKind::Scale => "scale",
            ItemKind::Matrix => "matrix",
            ItemKind::CustomFrontend => "custom-frontend",
            ItemKind::MultipleChoiceDropdown => "multiple-choice-dropdown",
            ItemKind::ClickableMultipleChoice => "clickable-multiple-choice",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Peer-review question type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Grade,
    Essay,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Grade => f.write_str("grade"),
            QuestionKind::Essay => f.write_str("essay"),
        }
    }
}

/// Layout direction of an item's options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Row,
    #[default]
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeedbackDisplayPolicy {
    #[default]
    DisplayFeedbackOnQuizItem,
    DisplayFeedbackOnAllOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantPointsPolicy {
    #[default]
    GrantWheneverPossible,
    GrantOnlyWhenAnswerFullyCorrect,
}

/// Grading of multiple-choice items that allow several selected options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradingPolicy {
    #[default]
    #[serde(rename = "default")]
    Standard,
    PointsOffIncorrectOptions,
    PointsOffUnselectedOptions,
    SomeCorrectNoneIncorrect,
}

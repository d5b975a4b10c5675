//! # Editing-Session State
//!
//! Scratch state the editor UI keeps per entity. None of it is part of the
//! quiz document sent to the host. Entries are created with their entity
//! (at bootstrap or by a creating mutation) and removed with it.

use quiz_schema::{EntityId, EntityKind, EntityTables, ItemKind, ItemRecord};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Visible range used for scale items that don't define their own bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleBounds {
    pub min: i64,
    pub max: i64,
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self { min: 1, max: 7 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizVariables {
    pub adding_new_item: bool,
    pub new_item_type: Option<ItemKind>,
    pub new_items: Vec<EntityId>,
    pub new_peer_reviews: Vec<EntityId>,
    pub valid_deadline: bool,
    pub new_quiz: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemVariables {
    pub advanced_editing: bool,
    pub testing_regex: bool,
    pub testing_format_regex: bool,
    pub validity_regex_test_answer: String,
    pub format_regex_test_answer: String,
    pub regex: String,
    pub format_regex: String,
    pub valid_regex: bool,
    pub valid_format_regex: bool,
    pub scale_min: i64,
    pub scale_max: i64,
    pub valid_range: bool,
    pub array: Vec<i64>,
    pub new_options: Vec<EntityId>,
}

impl ItemVariables {
    /// Fresh state for an item, seeded from its current fields
    pub fn for_item(item: &ItemRecord, scale: ScaleBounds) -> Self {
        let regex = item.validity_regex.clone().unwrap_or_default();
        let format_regex = item.format_regex.clone().unwrap_or_default();

        let mut variables = Self {
            advanced_editing: false,
            testing_regex: false,
            testing_format_regex: false,
            validity_regex_test_answer: String::new(),
            format_regex_test_answer: String::new(),
            valid_regex: compiles(&regex),
            valid_format_regex: compiles(&format_regex),
            regex,
            format_regex,
            scale_min: item.min_value.unwrap_or(scale.min),
            scale_max: item.max_value.unwrap_or(scale.max),
            valid_range: false,
            array: Vec::new(),
            new_options: Vec::new(),
        };
        variables.refresh_scale();
        variables
    }

    pub fn set_scale_min(&mut self, min: i64) {
        self.scale_min = min;
        self.refresh_scale();
    }

    pub fn set_scale_max(&mut self, max: i64) {
        self.scale_max = max;
        self.refresh_scale();
    }

    fn refresh_scale(&mut self) {
        self.valid_range = self.scale_min < self.scale_max;
        self.array = if self.valid_range {
            (self.scale_min..=self.scale_max).collect()
        } else {
            Vec::new()
        };
    }

    /// Store a validity regex as typed; returns whether it compiles
    pub fn set_regex(&mut self, regex: &str) -> bool {
        self.regex = regex.to_string();
        self.valid_regex = compiles(regex);
        self.valid_regex
    }

    /// Store a format regex as typed; returns whether it compiles
    pub fn set_format_regex(&mut self, regex: &str) -> bool {
        self.format_regex = regex.to_string();
        self.valid_format_regex = compiles(regex);
        self.valid_format_regex
    }

    /// Whether the test answer matches the validity regex, if it compiles
    pub fn validity_test_matches(&self) -> Option<bool> {
        test_match(&self.regex, &self.validity_regex_test_answer)
    }

    /// Whether the test answer matches the format regex, if it compiles
    pub fn format_test_matches(&self) -> Option<bool> {
        test_match(&self.format_regex, &self.format_regex_test_answer)
    }

    pub fn is_valid(&self) -> bool {
        self.valid_regex && self.valid_format_regex && self.valid_range
    }
}

fn compiles(regex: &str) -> bool {
    Regex::new(regex).is_ok()
}

fn test_match(regex: &str, answer: &str) -> Option<bool> {
    Regex::new(regex).ok().map(|re| re.is_match(answer))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionVariables {
    pub option_editing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewCollectionVariables {
    pub new_questions: Vec<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionVariables {
    pub editing: bool,
}

/// Session state for every entity in the store, one map per kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionVariables {
    pub quizzes: HashMap<EntityId, QuizVariables>,
    pub items: HashMap<EntityId, ItemVariables>,
    pub options: HashMap<EntityId, OptionVariables>,
    pub peer_review_collections: HashMap<EntityId, PeerReviewCollectionVariables>,
    pub questions: HashMap<EntityId, QuestionVariables>,
}

impl SessionVariables {
    /// Default state for every entity present at bootstrap
    pub fn for_tables(tables: &EntityTables, scale: ScaleBounds) -> Self {
        let quizzes = tables
            .quizzes
            .values()
            .map(|quiz| {
                let valid_deadline = match (quiz.open, quiz.deadline) {
                    (Some(open), Some(deadline)) => deadline >= open,
                    _ => true,
                };
                let variables = QuizVariables {
                    valid_deadline,
                    ..QuizVariables::default()
                };
                (quiz.id.clone(), variables)
            })
            .collect();

        Self {
            quizzes,
            items: tables
                .items
                .values()
                .map(|item| (item.id.clone(), ItemVariables::for_item(item, scale)))
                .collect(),
            options: defaults_for(tables.options.keys()),
            peer_review_collections: defaults_for(tables.peer_review_collections.keys()),
            questions: defaults_for(tables.questions.keys()),
        }
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Quiz => self.quizzes.contains_key(id),
            EntityKind::Item => self.items.contains_key(id),
            EntityKind::Option => self.options.contains_key(id),
            EntityKind::PeerReviewCollection => self.peer_review_collections.contains_key(id),
            EntityKind::Question => self.questions.contains_key(id),
        }
    }

    pub fn ids(&self, kind: EntityKind) -> Vec<&EntityId> {
        match kind {
            EntityKind::Quiz => self.quizzes.keys().collect(),
            EntityKind::Item => self.items.keys().collect(),
            EntityKind::Option => self.options.keys().collect(),
            EntityKind::PeerReviewCollection => self.peer_review_collections.keys().collect(),
            EntityKind::Question => self.questions.keys().collect(),
        }
    }

    /// False while any item holds a regex or scale range the host can't use
    pub fn is_valid(&self) -> bool {
        self.quizzes.values().all(|quiz| quiz.valid_deadline)
            && self.items.values().all(ItemVariables::is_valid)
    }
}

fn defaults_for<'a, T: Default>(ids: impl Iterator<Item = &'a EntityId>) -> HashMap<EntityId, T> {
    ids.map(|id| (id.clone(), T::default())).collect()
}

/// Edits that only touch session state, never the quiz document
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    SetAdvancedEditing { item_id: EntityId, open: bool },
    SetTestingRegex { item_id: EntityId, testing: bool },
    SetTestingFormatRegex { item_id: EntityId, testing: bool },
    SetValidityRegexTestAnswer { item_id: EntityId, answer: String },
    SetFormatRegexTestAnswer { item_id: EntityId, answer: String },
    SetAddingNewItem { quiz_id: EntityId, adding: bool, kind: Option<ItemKind> },
    SetOptionEditing { option_id: EntityId, editing: bool },
    SetQuestionEditing { question_id: EntityId, editing: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_schema::QuizItem;

    fn open_item(regex: Option<&str>) -> ItemRecord {
        let mut item: ItemRecord = QuizItem::new("item-1".into(), "quiz-1".into(), ItemKind::Open, 0);
        item.validity_regex = regex.map(str::to_string);
        item
    }

    #[test]
    fn test_seeded_from_item_fields() {
        let variables = ItemVariables::for_item(&open_item(Some("^[0-9]+$")), ScaleBounds::default());

        assert_eq!(variables.regex, "^[0-9]+$");
        assert!(variables.valid_regex);
        assert_eq!(variables.array, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(variables.is_valid());
    }

    #[test]
    fn test_invalid_regex_is_kept_and_flagged() {
        let mut variables = ItemVariables::for_item(&open_item(None), ScaleBounds::default());

        assert!(!variables.set_regex("[0-9"));
        assert_eq!(variables.regex, "[0-9");
        assert!(!variables.valid_regex);
        assert!(!variables.is_valid());
        assert_eq!(variables.validity_test_matches(), None);

        assert!(variables.set_regex("[0-9]"));
        variables.validity_regex_test_answer = "a1".into();
        assert_eq!(variables.validity_test_matches(), Some(true));
    }

    #[test]
    fn test_inverted_scale_range_is_invalid() {
        let mut variables = ItemVariables::for_item(&open_item(None), ScaleBounds { min: 1, max: 3 });
        assert_eq!(variables.array, vec![1, 2, 3]);

        variables.set_scale_min(5);
        assert!(!variables.valid_range);
        assert!(variables.array.is_empty());

        variables.set_scale_max(6);
        assert_eq!(variables.array, vec![5, 6]);
    }
}

//! Mapping from active action units to an emotion label.
//!
//! The table is evaluated top to bottom and the first matching rule wins.
//! Rule conditions overlap (a frame with AU1, AU4, AU15 and AU26 satisfies
//! the Surprise, Sadness and Anger rules at once), so the order of
//! [`RULES`] decides the label and must not change.

use serde::Serialize;

use crate::types::ActionUnit::{Au1, Au12, Au15, Au26, Au4};
use crate::types::{ActionUnitSet, Emotion};

/// One row of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Units that must all be active.
    pub requires: ActionUnitSet,
    /// When set, the activation must contain exactly this many units.
    pub exact_count: Option<usize>,
    pub emotion: Emotion,
}

impl Rule {
    const fn new(requires: ActionUnitSet, emotion: Emotion) -> Self {
        Self {
            requires,
            exact_count: None,
            emotion,
        }
    }

    const fn only(requires: ActionUnitSet, emotion: Emotion) -> Self {
        Self {
            requires,
            exact_count: Some(requires.len()),
            emotion,
        }
    }

    pub fn matches(&self, active: &ActionUnitSet) -> bool {
        active.is_superset(&self.requires)
            && self.exact_count.map_or(true, |n| active.len() == n)
    }
}

/// The classification table, in evaluation order.
pub static RULES: [Rule; 5] = [
    Rule::new(ActionUnitSet::of(&[Au1, Au26]), Emotion::Surprise),
    Rule::new(ActionUnitSet::of(&[Au1, Au4, Au15]), Emotion::Sadness),
    Rule::new(ActionUnitSet::of(&[Au4, Au26]), Emotion::Anger),
    Rule::only(ActionUnitSet::of(&[Au12]), Emotion::Disgust),
    Rule::new(ActionUnitSet::of(&[Au12]), Emotion::Happiness),
];

/// Label assigned when no rule matches.
pub const FALLBACK: Emotion = Emotion::Neutral;

/// The first rule that matches, or `None` when the fallback applies.
pub fn matching_rule(active: &ActionUnitSet) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(active))
}

/// Classify a frame's active action units. Total over all 32 subsets.
pub fn classify(active: &ActionUnitSet) -> Emotion {
    matching_rule(active).map_or(FALLBACK, |rule| rule.emotion)
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of landmarks in the canonical face mesh indexing scheme.
pub const FACE_MESH_LANDMARKS: usize = 468;

/// Canonical face mesh indices read by the action unit predicates.
pub mod landmarks {
    /// Inner edge of the upper lip.
    pub const UPPER_LIP: usize = 13;
    /// Inner edge of the lower lip.
    pub const LOWER_LIP: usize = 14;
    pub const CHIN: usize = 17;
    /// Left mouth corner.
    pub const MOUTH_LEFT: usize = 61;
    /// Inner brow.
    pub const BROW: usize = 65;
    /// Upper eyelid.
    pub const EYE_UPPER: usize = 159;
    /// Right mouth corner.
    pub const MOUTH_RIGHT: usize = 291;
    /// Inner eye point used as the brow lowering reference.
    pub const EYE_INNER: usize = 386;

    /// Every index the extractor reads, ascending.
    pub const REQUIRED: [usize; 8] = [
        UPPER_LIP,
        LOWER_LIP,
        CHIN,
        MOUTH_LEFT,
        BROW,
        EYE_UPPER,
        MOUTH_RIGHT,
        EYE_INNER,
    ];

    /// Smallest landmark count that covers every required index.
    pub const MIN_LANDMARKS: usize = EYE_INNER + 1;
}

/// A landmark position in normalized image coordinates.
///
/// `x` and `y` are in [0, 1] with the origin at the top-left corner and
/// `y` increasing downward. `z` is relative depth and is never read by
/// the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub const fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Convert to pixel coordinates for an image of the given size.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// The landmarks of one detected face, ordered by canonical index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// A full face mesh with every landmark at the origin.
    pub fn zeros(n: usize) -> Self {
        Self {
            points: vec![Point::zero(); n],
        }
    }

    pub fn num_landmarks(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Checked access to a landmark.
    pub fn point(&self, index: usize) -> Result<&Point> {
        self.points.get(index).ok_or(Error::InvalidLandmarkSet {
            index,
            len: self.points.len(),
        })
    }

    /// Whether every index the extractor reads is present.
    pub fn covers_required(&self) -> bool {
        self.points.len() >= landmarks::MIN_LANDMARKS
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Point;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.points[idx]
    }
}

impl std::ops::IndexMut<usize> for LandmarkSet {
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.points[idx]
    }
}

/// The FACS action units this crate detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionUnit {
    #[serde(rename = "AU1")]
    Au1,
    #[serde(rename = "AU4")]
    Au4,
    #[serde(rename = "AU12")]
    Au12,
    #[serde(rename = "AU15")]
    Au15,
    #[serde(rename = "AU26")]
    Au26,
}

impl ActionUnit {
    /// All action units in detection order.
    pub const ALL: [ActionUnit; 5] = [
        ActionUnit::Au1,
        ActionUnit::Au4,
        ActionUnit::Au12,
        ActionUnit::Au15,
        ActionUnit::Au26,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ActionUnit::Au1 => "AU1",
            ActionUnit::Au4 => "AU4",
            ActionUnit::Au12 => "AU12",
            ActionUnit::Au15 => "AU15",
            ActionUnit::Au26 => "AU26",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionUnit::Au1 => "Inner Brow Raise",
            ActionUnit::Au4 => "Brow Lower",
            ActionUnit::Au12 => "Lip Corner Pull",
            ActionUnit::Au15 => "Lip Corner Depressor",
            ActionUnit::Au26 => "Jaw Drop",
        }
    }

    /// The pair of landmark indices the unit is measured between.
    pub fn landmark_pair(&self) -> (usize, usize) {
        match self {
            ActionUnit::Au1 => (landmarks::BROW, landmarks::EYE_UPPER),
            ActionUnit::Au4 => (landmarks::BROW, landmarks::EYE_INNER),
            ActionUnit::Au12 => (landmarks::MOUTH_LEFT, landmarks::MOUTH_RIGHT),
            ActionUnit::Au15 => (landmarks::MOUTH_LEFT, landmarks::CHIN),
            ActionUnit::Au26 => (landmarks::UPPER_LIP, landmarks::LOWER_LIP),
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for ActionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The set of action units active in one frame.
///
/// Membership is all that matters; iteration always yields units in
/// detection order (AU1, AU4, AU12, AU15, AU26).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ActionUnit>", into = "Vec<ActionUnit>")]
pub struct ActionUnitSet(u8);

impl ActionUnitSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set in const context.
    pub const fn of(units: &[ActionUnit]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < units.len() {
            bits |= units[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub fn insert(&mut self, unit: ActionUnit) {
        self.0 |= unit.bit();
    }

    pub const fn contains(&self, unit: ActionUnit) -> bool {
        self.0 & unit.bit() != 0
    }

    /// Whether every unit of `other` is also in `self`.
    pub const fn is_superset(&self, other: &ActionUnitSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionUnit> + '_ {
        ActionUnit::ALL.into_iter().filter(|unit| self.contains(*unit))
    }
}

impl FromIterator<ActionUnit> for ActionUnitSet {
    fn from_iter<T: IntoIterator<Item = ActionUnit>>(iter: T) -> Self {
        let mut set = Self::empty();
        for unit in iter {
            set.insert(unit);
        }
        set
    }
}

impl From<Vec<ActionUnit>> for ActionUnitSet {
    fn from(units: Vec<ActionUnit>) -> Self {
        units.into_iter().collect()
    }
}

impl From<ActionUnitSet> for Vec<ActionUnit> {
    fn from(set: ActionUnitSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Display for ActionUnitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, unit) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(unit.code())?;
        }
        Ok(())
    }
}

/// Emotion labels produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Emotion {
    Surprise,
    Sadness,
    Anger,
    Happiness,
    Disgust,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Surprise,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Happiness,
        Emotion::Disgust,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Surprise => "Surprise",
            Emotion::Sadness => "Sadness",
            Emotion::Anger => "Anger",
            Emotion::Happiness => "Happiness",
            Emotion::Disgust => "Disgust",
            Emotion::Neutral => "Neutral",
        }
    }

    /// Display color used for overlays and charts (RGB).
    pub fn color(&self) -> [u8; 3] {
        match self {
            Emotion::Surprise => [255, 190, 0],
            Emotion::Sadness => [70, 110, 220],
            Emotion::Anger => [220, 40, 40],
            Emotion::Happiness => [40, 190, 80],
            Emotion::Disgust => [150, 90, 190],
            Emotion::Neutral => [150, 150, 150],
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_point_access() {
        let set = LandmarkSet::zeros(20);
        assert!(set.point(17).is_ok());

        match set.point(386) {
            Err(Error::InvalidLandmarkSet { index, len }) => {
                assert_eq!(index, 386);
                assert_eq!(len, 20);
            }
            other => panic!("expected InvalidLandmarkSet, got {:?}", other),
        }
    }

    #[test]
    fn required_coverage() {
        assert!(LandmarkSet::zeros(FACE_MESH_LANDMARKS).covers_required());
        assert!(LandmarkSet::zeros(landmarks::MIN_LANDMARKS).covers_required());
        assert!(!LandmarkSet::zeros(landmarks::EYE_INNER).covers_required());
    }

    #[test]
    fn set_membership_ignores_order() {
        let a: ActionUnitSet = vec![ActionUnit::Au26, ActionUnit::Au1].into();
        let b = ActionUnitSet::of(&[ActionUnit::Au1, ActionUnit::Au26, ActionUnit::Au1]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a.contains(ActionUnit::Au1));
        assert!(!a.contains(ActionUnit::Au4));
        assert!(a.is_superset(&ActionUnitSet::of(&[ActionUnit::Au26])));
        assert!(a.is_superset(&ActionUnitSet::empty()));
    }

    #[test]
    fn set_display_uses_detection_order() {
        let set: ActionUnitSet = [ActionUnit::Au26, ActionUnit::Au12, ActionUnit::Au1]
            .into_iter()
            .collect();
        assert_eq!(set.to_string(), "AU1, AU12, AU26");
        assert_eq!(ActionUnitSet::empty().to_string(), "");
    }

    #[test]
    fn set_serializes_as_codes() {
        let set = ActionUnitSet::of(&[ActionUnit::Au4, ActionUnit::Au15]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["AU4","AU15"]"#);

        let back: ActionUnitSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn point_depth_defaults_to_zero() {
        let p: Point = serde_json::from_str(r#"{"x":0.25,"y":0.75}"#).unwrap();
        assert_eq!(p, Point::new(0.25, 0.75));
        assert_eq!(p.to_pixel(200, 100), (50.0, 75.0));
    }
}

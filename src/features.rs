use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::error::{Error, Result};
use crate::types::{landmarks as mesh, ActionUnit, ActionUnitSet, LandmarkSet, Point};

/// Read access to landmarks by canonical index.
///
/// The extractor only needs this one capability, so callers holding
/// landmarks in their own containers can implement it directly instead
/// of copying into a [`LandmarkSet`].
pub trait LandmarkAccess {
    /// The landmark at `index`, or `None` if the set does not contain it.
    fn landmark(&self, index: usize) -> Option<Point>;

    fn num_landmarks(&self) -> usize;
}

impl LandmarkAccess for LandmarkSet {
    fn landmark(&self, index: usize) -> Option<Point> {
        self.get(index).copied()
    }

    fn num_landmarks(&self) -> usize {
        self.points.len()
    }
}

impl LandmarkAccess for [Point] {
    fn landmark(&self, index: usize) -> Option<Point> {
        self.get(index).copied()
    }

    fn num_landmarks(&self) -> usize {
        self.len()
    }
}

fn require<L: LandmarkAccess + ?Sized>(landmarks: &L, index: usize) -> Result<Point> {
    landmarks.landmark(index).ok_or(Error::InvalidLandmarkSet {
        index,
        len: landmarks.num_landmarks(),
    })
}

/// Raw geometric measurement behind an action unit.
///
/// - AU1: brow(65).y - eye(159).y
/// - AU4: brow(65).y - inner eye(386).y
/// - AU12: |mouth right(291).x - mouth left(61).x|
/// - AU15: mouth corner(61).y - chin(17).y
/// - AU26: lower lip(14).y - upper lip(13).y
pub fn measure<L: LandmarkAccess + ?Sized>(unit: ActionUnit, landmarks: &L) -> Result<f32> {
    let value = match unit {
        ActionUnit::Au1 => {
            let brow = require(landmarks, mesh::BROW)?.y;
            let eye = require(landmarks, mesh::EYE_UPPER)?.y;
            brow - eye
        }
        ActionUnit::Au4 => {
            let brow = require(landmarks, mesh::BROW)?.y;
            let inner_eye = require(landmarks, mesh::EYE_INNER)?.y;
            brow - inner_eye
        }
        ActionUnit::Au12 => {
            let left_corner = require(landmarks, mesh::MOUTH_LEFT)?.x;
            let right_corner = require(landmarks, mesh::MOUTH_RIGHT)?.x;
            (right_corner - left_corner).abs()
        }
        ActionUnit::Au15 => {
            let corner = require(landmarks, mesh::MOUTH_LEFT)?.y;
            let chin = require(landmarks, mesh::CHIN)?.y;
            corner - chin
        }
        ActionUnit::Au26 => {
            let top_lip = require(landmarks, mesh::UPPER_LIP)?.y;
            let bottom_lip = require(landmarks, mesh::LOWER_LIP)?.y;
            bottom_lip - top_lip
        }
    };
    Ok(value)
}

/// Inner brow raise.
pub fn detect_au1<L: LandmarkAccess + ?Sized>(landmarks: &L) -> Result<bool> {
    ActionUnitExtractor::default().detect(ActionUnit::Au1, landmarks)
}

/// Brow lowerer.
pub fn detect_au4<L: LandmarkAccess + ?Sized>(landmarks: &L) -> Result<bool> {
    ActionUnitExtractor::default().detect(ActionUnit::Au4, landmarks)
}

/// Lip corner pull.
pub fn detect_au12<L: LandmarkAccess + ?Sized>(landmarks: &L) -> Result<bool> {
    ActionUnitExtractor::default().detect(ActionUnit::Au12, landmarks)
}

/// Lip corner depressor.
pub fn detect_au15<L: LandmarkAccess + ?Sized>(landmarks: &L) -> Result<bool> {
    ActionUnitExtractor::default().detect(ActionUnit::Au15, landmarks)
}

/// Jaw drop.
pub fn detect_au26<L: LandmarkAccess + ?Sized>(landmarks: &L) -> Result<bool> {
    ActionUnitExtractor::default().detect(ActionUnit::Au26, landmarks)
}

/// Raw measurements for all five units of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionUnitMeasurements {
    pub au1: f32,
    pub au4: f32,
    pub au12: f32,
    pub au15: f32,
    pub au26: f32,
}

impl ActionUnitMeasurements {
    pub fn get(&self, unit: ActionUnit) -> f32 {
        match unit {
            ActionUnit::Au1 => self.au1,
            ActionUnit::Au4 => self.au4,
            ActionUnit::Au12 => self.au12,
            ActionUnit::Au15 => self.au15,
            ActionUnit::Au26 => self.au26,
        }
    }
}

/// Converts a landmark set into the set of active action units.
///
/// Stateless: the same landmarks always produce the same activation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActionUnitExtractor {
    thresholds: Thresholds,
}

impl ActionUnitExtractor {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Evaluate a single action unit predicate.
    pub fn detect<L: LandmarkAccess + ?Sized>(&self, unit: ActionUnit, landmarks: &L) -> Result<bool> {
        let value = measure(unit, landmarks)?;
        Ok(self.thresholds.is_active(unit, value))
    }

    /// Evaluate all five predicates and collect the active units.
    ///
    /// Fails with [`Error::InvalidLandmarkSet`] if any required landmark is
    /// missing.
    pub fn extract<L: LandmarkAccess + ?Sized>(&self, landmarks: &L) -> Result<ActionUnitSet> {
        let mut active = ActionUnitSet::empty();
        for unit in ActionUnit::ALL {
            if self.detect(unit, landmarks)? {
                active.insert(unit);
            }
        }
        Ok(active)
    }

    pub fn measure_all<L: LandmarkAccess + ?Sized>(&self, landmarks: &L) -> Result<ActionUnitMeasurements> {
        Ok(ActionUnitMeasurements {
            au1: measure(ActionUnit::Au1, landmarks)?,
            au4: measure(ActionUnit::Au4, landmarks)?,
            au12: measure(ActionUnit::Au12, landmarks)?,
            au15: measure(ActionUnit::Au15, landmarks)?,
            au26: measure(ActionUnit::Au26, landmarks)?,
        })
    }
}

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ActionUnit;

/// Activation thresholds for the five action units, in normalized units.
///
/// AU1 is active when its measurement falls *below* its threshold; every
/// other unit is active when its measurement rises *above* it. Both
/// comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub au1: f32,
    pub au4: f32,
    pub au12: f32,
    pub au15: f32,
    pub au26: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            au1: -0.02,
            au4: 0.02,
            au12: 0.35,
            au15: 0.05,
            au26: 0.03,
        }
    }
}

impl Thresholds {
    /// Load thresholds from a JSON file. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let thresholds: Self = serde_json::from_reader(reader)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for unit in ActionUnit::ALL {
            let value = self.get(unit);
            if !value.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "{} threshold must be finite, got {}",
                    unit, value
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, unit: ActionUnit) -> f32 {
        match unit {
            ActionUnit::Au1 => self.au1,
            ActionUnit::Au4 => self.au4,
            ActionUnit::Au12 => self.au12,
            ActionUnit::Au15 => self.au15,
            ActionUnit::Au26 => self.au26,
        }
    }

    /// Apply the unit's threshold to a raw measurement.
    pub fn is_active(&self, unit: ActionUnit, value: f32) -> bool {
        match unit {
            ActionUnit::Au1 => value < self.au1,
            _ => value > self.get(unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rule_constants() {
        let t = Thresholds::default();
        assert_eq!(t.get(ActionUnit::Au1), -0.02);
        assert_eq!(t.get(ActionUnit::Au4), 0.02);
        assert_eq!(t.get(ActionUnit::Au12), 0.35);
        assert_eq!(t.get(ActionUnit::Au15), 0.05);
        assert_eq!(t.get(ActionUnit::Au26), 0.03);
    }

    #[test]
    fn comparisons_are_strict() {
        let t = Thresholds::default();
        assert!(!t.is_active(ActionUnit::Au1, -0.02));
        assert!(t.is_active(ActionUnit::Au1, -0.03));
        assert!(!t.is_active(ActionUnit::Au26, 0.03));
        assert!(t.is_active(ActionUnit::Au26, 0.04));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let t: Thresholds = serde_json::from_str(r#"{"au12": 0.3}"#).unwrap();
        assert_eq!(t.au12, 0.3);
        assert_eq!(t.au26, Thresholds::default().au26);
    }

    #[test]
    fn save_and_load_thresholds() {
        let t = Thresholds {
            au4: 0.025,
            ..Thresholds::default()
        };

        let temp_path = std::env::temp_dir().join("facs_emotion_thresholds.json");
        t.save(&temp_path).unwrap();

        let loaded = Thresholds::load(&temp_path).unwrap();
        assert_eq!(loaded, t);

        std::fs::remove_file(temp_path).ok();
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let t = Thresholds {
            au15: f32::NAN,
            ..Thresholds::default()
        };
        assert!(matches!(t.validate(), Err(Error::InvalidConfig(_))));
    }
}

//! Frequency aggregation over an analysis log.
//!
//! This is what reporting front ends display next to the frame table: how
//! often each emotion label was assigned, and how often each action unit
//! fired.

use serde::Serialize;

use crate::pipeline::AnalysisLog;
use crate::types::{ActionUnit, Emotion};

/// Emotion and action unit frequencies for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmotionSummary {
    /// Number of frames in the log.
    pub total_frames: usize,

    /// Label counts, most frequent first. Ties keep label order and labels
    /// that never occurred are omitted.
    pub emotion_counts: Vec<(Emotion, usize)>,

    /// Number of frames in which each action unit was active, in detection order.
    pub unit_counts: Vec<(ActionUnit, usize)>,
}

impl EmotionSummary {
    pub fn from_log(log: &AnalysisLog) -> Self {
        let mut emotion_counts: Vec<(Emotion, usize)> = Emotion::ALL
            .iter()
            .map(|&emotion| (emotion, log.count(emotion)))
            .filter(|&(_, count)| count > 0)
            .collect();
        // Stable sort keeps label order among equal counts.
        emotion_counts.sort_by(|a, b| b.1.cmp(&a.1));

        let unit_counts = ActionUnit::ALL
            .iter()
            .map(|&unit| {
                let count = log
                    .iter()
                    .filter(|r| r.active_units().contains(unit))
                    .count();
                (unit, count)
            })
            .collect();

        Self {
            total_frames: log.len(),
            emotion_counts,
            unit_counts,
        }
    }

    pub fn count(&self, emotion: Emotion) -> usize {
        self.emotion_counts
            .iter()
            .find(|(e, _)| *e == emotion)
            .map_or(0, |&(_, count)| count)
    }

    /// The most frequent label, if any frame was analyzed.
    pub fn dominant(&self) -> Option<Emotion> {
        self.emotion_counts.first().map(|&(emotion, _)| emotion)
    }

    /// Share of analyzed frames with this label, as a percentage.
    pub fn percentage(&self, emotion: Emotion) -> f32 {
        ratio(self.count(emotion) as f32, self.total_frames as f32)
    }

    /// Share of analyzed frames in which this unit was active, as a percentage.
    pub fn unit_percentage(&self, unit: ActionUnit) -> f32 {
        let count = self
            .unit_counts
            .iter()
            .find(|(u, _)| *u == unit)
            .map_or(0, |&(_, count)| count);
        ratio(count as f32, self.total_frames as f32)
    }

    /// Largest single label count, used to scale bar charts.
    pub fn max_count(&self) -> usize {
        self.emotion_counts.first().map_or(0, |&(_, count)| count)
    }
}

/// Calculate percentage ratio, handling division by zero.
fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator > 0.0 {
        (numerator / denominator) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ActionUnitExtractor;
    use crate::pipeline::FrameAnalysisPipeline;
    use crate::types::{landmarks, LandmarkSet, Point, FACE_MESH_LANDMARKS};

    fn face(mouth_width: f32, jaw_open: f32) -> LandmarkSet {
        let mut face = LandmarkSet::zeros(FACE_MESH_LANDMARKS);
        face[landmarks::BROW] = Point::new(0.42, 0.35);
        face[landmarks::EYE_UPPER] = Point::new(0.40, 0.36);
        face[landmarks::EYE_INNER] = Point::new(0.58, 0.36);
        face[landmarks::MOUTH_LEFT] = Point::new(0.5 - mouth_width / 2.0, 0.70);
        face[landmarks::MOUTH_RIGHT] = Point::new(0.5 + mouth_width / 2.0, 0.70);
        face[landmarks::CHIN] = Point::new(0.50, 0.80);
        face[landmarks::UPPER_LIP] = Point::new(0.50, 0.70);
        face[landmarks::LOWER_LIP] = Point::new(0.50, 0.70 + jaw_open);
        face
    }

    fn summary_of(frames: Vec<Option<LandmarkSet>>) -> EmotionSummary {
        let mut pipeline = FrameAnalysisPipeline::new(ActionUnitExtractor::default());
        pipeline.run(frames);
        EmotionSummary::from_log(pipeline.log())
    }

    #[test]
    fn counts_sorted_by_frequency() {
        let summary = summary_of(vec![
            Some(face(0.2, 0.0)),  // Neutral
            Some(face(0.4, 0.0)),  // Disgust
            Some(face(0.4, 0.05)), // Happiness
            Some(face(0.4, 0.0)),  // Disgust
            None,
        ]);

        assert_eq!(summary.total_frames, 4);
        assert_eq!(
            summary.emotion_counts,
            vec![
                (Emotion::Disgust, 2),
                (Emotion::Happiness, 1),
                (Emotion::Neutral, 1),
            ]
        );
        assert_eq!(summary.dominant(), Some(Emotion::Disgust));
        assert_eq!(summary.count(Emotion::Anger), 0);
        assert!((summary.percentage(Emotion::Disgust) - 50.0).abs() < 0.01);
        assert!((summary.unit_percentage(ActionUnit::Au12) - 75.0).abs() < 0.01);
        assert_eq!(summary.max_count(), 2);
    }

    #[test]
    fn unit_counts_cover_every_unit() {
        let summary = summary_of(vec![Some(face(0.4, 0.05))]);
        let units: Vec<ActionUnit> = summary.unit_counts.iter().map(|&(u, _)| u).collect();
        assert_eq!(units, ActionUnit::ALL.to_vec());
        assert_eq!(summary.unit_counts[2], (ActionUnit::Au12, 1));
        assert_eq!(summary.unit_counts[4], (ActionUnit::Au26, 1));
        assert_eq!(summary.unit_counts[0], (ActionUnit::Au1, 0));
    }

    #[test]
    fn empty_log() {
        let summary = EmotionSummary::from_log(&AnalysisLog::new());
        assert_eq!(summary.total_frames, 0);
        assert!(summary.dominant().is_none());
        assert_eq!(summary.percentage(Emotion::Neutral), 0.0);
    }

    #[test]
    fn test_ratio() {
        assert!((ratio(25.0, 100.0) - 25.0).abs() < 0.01);
        assert!((ratio(0.0, 100.0) - 0.0).abs() < 0.01);
        assert!((ratio(100.0, 0.0) - 0.0).abs() < 0.01); // Division by zero
    }
}

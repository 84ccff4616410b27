use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::{ActionUnitExtractor, LandmarkAccess};
use crate::rules::classify;
use crate::types::{ActionUnitSet, Emotion, LandmarkSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The analysis result for one frame in which a face was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    frame_index: usize,
    emotion: Emotion,
    active_units: ActionUnitSet,
}

impl FrameRecord {
    pub fn new(frame_index: usize, emotion: Emotion, active_units: ActionUnitSet) -> Self {
        Self {
            frame_index,
            emotion,
            active_units,
        }
    }

    /// Position of the frame in the source sequence.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn active_units(&self) -> ActionUnitSet {
        self.active_units
    }
}

impl fmt::Display for FrameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {}: {} [{}]", self.frame_index, self.emotion, self.active_units)
    }
}

/// Append-only, frame-ordered sequence of [`FrameRecord`]s.
///
/// Frames without a face have no entry, so indices are not contiguous.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisLog {
    records: Vec<FrameRecord>,
}

impl AnalysisLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, record: FrameRecord) {
        debug_assert!(
            self.records
                .last()
                .map_or(true, |last| last.frame_index < record.frame_index),
            "frame records must be appended in frame order"
        );
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameRecord> {
        self.records.iter()
    }

    /// Look up the record for a source frame, if that frame was analyzed.
    pub fn get(&self, frame_index: usize) -> Option<&FrameRecord> {
        self.records
            .binary_search_by_key(&frame_index, |r| r.frame_index)
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn count(&self, emotion: Emotion) -> usize {
        self.records.iter().filter(|r| r.emotion == emotion).count()
    }
}

impl<'a> IntoIterator for &'a AnalysisLog {
    type Item = &'a FrameRecord;
    type IntoIter = std::slice::Iter<'a, FrameRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// What happened to a single input frame.
#[derive(Debug)]
pub enum FrameOutcome {
    Recorded(FrameRecord),
    /// No landmarks were supplied for the frame.
    NoFace,
    /// The landmarks could not be analyzed; the frame is skipped.
    Failed(Error),
}

/// Per-session frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub frames_seen: usize,
    pub analyzed: usize,
    pub no_face: usize,
    pub failed: usize,
}

/// The outcome of a whole session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub log: AnalysisLog,
    pub stats: FrameStats,
}

/// Runs extraction and classification over a sequence of frames.
///
/// Each frame is analyzed on its own; the only state kept between frames
/// is the output log and the frame counters. There is no temporal
/// smoothing, so consumers that need stable labels must add it on top.
#[derive(Debug, Clone, Default)]
pub struct FrameAnalysisPipeline {
    extractor: ActionUnitExtractor,
    log: AnalysisLog,
    stats: FrameStats,
    /// Lowest frame index still accepted.
    next_frame: usize,
}

impl FrameAnalysisPipeline {
    pub fn new(extractor: ActionUnitExtractor) -> Self {
        Self {
            extractor,
            log: AnalysisLog::new(),
            stats: FrameStats::default(),
            next_frame: 0,
        }
    }

    pub fn extractor(&self) -> &ActionUnitExtractor {
        &self.extractor
    }

    /// Analyze one face without recording it. Used for live overlays.
    pub fn analyze<L: LandmarkAccess + ?Sized>(&self, landmarks: &L) -> Result<(Emotion, ActionUnitSet)> {
        let active = self.extractor.extract(landmarks)?;
        Ok((classify(&active), active))
    }

    /// Analyze a frame without touching the log or counters.
    ///
    /// A frame index below [`next_frame`](Self::next_frame) fails with
    /// [`Error::OutOfOrderFrame`].
    pub fn evaluate<L: LandmarkAccess + ?Sized>(&self, frame_index: usize, landmarks: Option<&L>) -> FrameOutcome {
        if frame_index < self.next_frame {
            return FrameOutcome::Failed(Error::OutOfOrderFrame {
                index: frame_index,
                next: self.next_frame,
            });
        }

        let Some(landmarks) = landmarks else {
            return FrameOutcome::NoFace;
        };

        match self.analyze(landmarks) {
            Ok((emotion, active)) => FrameOutcome::Recorded(FrameRecord::new(frame_index, emotion, active)),
            Err(e) => FrameOutcome::Failed(e),
        }
    }

    /// Analyze a frame and append the result to the session log.
    pub fn process_frame<L: LandmarkAccess + ?Sized>(
        &mut self,
        frame_index: usize,
        landmarks: Option<&L>,
    ) -> FrameOutcome {
        let outcome = self.evaluate(frame_index, landmarks);
        self.record(frame_index, &outcome);
        outcome
    }

    fn record(&mut self, frame_index: usize, outcome: &FrameOutcome) {
        self.stats.frames_seen += 1;
        if !matches!(outcome, FrameOutcome::Failed(Error::OutOfOrderFrame { .. })) {
            self.next_frame = frame_index + 1;
        }
        match outcome {
            FrameOutcome::Recorded(record) => {
                debug!("{}", record);
                self.stats.analyzed += 1;
                self.log.push(*record);
            }
            FrameOutcome::NoFace => {
                self.stats.no_face += 1;
            }
            FrameOutcome::Failed(e) => {
                warn!("Skipping frame {}: {}", frame_index, e);
                self.stats.failed += 1;
            }
        }
    }

    /// Process a sequence of frames. `None` marks a frame without a face.
    ///
    /// Frame indices continue from [`next_frame`](Self::next_frame).
    pub fn run<I>(&mut self, frames: I)
    where
        I: IntoIterator<Item = Option<LandmarkSet>>,
    {
        for frame in frames {
            let frame_index = self.next_frame;
            self.process_frame(frame_index, frame.as_ref());
        }
    }

    /// Process frames in parallel, merging results back in frame order.
    ///
    /// Produces the same log and counters as [`run`](Self::run).
    #[cfg(feature = "parallel")]
    pub fn run_parallel(&mut self, frames: &[Option<LandmarkSet>]) {
        let offset = self.next_frame;
        let pipeline = &*self;
        let outcomes: Vec<FrameOutcome> = frames
            .par_iter()
            .enumerate()
            .map(|(i, frame)| pipeline.evaluate(offset + i, frame.as_ref()))
            .collect();

        for (i, outcome) in outcomes.iter().enumerate() {
            self.record(offset + i, outcome);
        }
    }

    /// One past the last frame index accepted by this pipeline.
    pub fn next_frame(&self) -> usize {
        self.next_frame
    }

    pub fn log(&self) -> &AnalysisLog {
        &self.log
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn finish(self) -> AnalysisReport {
        info!(
            "Analyzed {} of {} frames ({} without a face, {} failed)",
            self.stats.analyzed, self.stats.frames_seen, self.stats.no_face, self.stats.failed
        );
        AnalysisReport {
            log: self.log,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{landmarks, ActionUnit, Point, FACE_MESH_LANDMARKS};

    fn smiling_face() -> LandmarkSet {
        let mut face = LandmarkSet::zeros(FACE_MESH_LANDMARKS);
        face[landmarks::BROW] = Point::new(0.42, 0.35);
        face[landmarks::EYE_UPPER] = Point::new(0.40, 0.36);
        face[landmarks::EYE_INNER] = Point::new(0.58, 0.36);
        face[landmarks::MOUTH_LEFT] = Point::new(0.30, 0.70);
        face[landmarks::MOUTH_RIGHT] = Point::new(0.70, 0.70);
        face[landmarks::CHIN] = Point::new(0.50, 0.74);
        face[landmarks::UPPER_LIP] = Point::new(0.50, 0.69);
        face[landmarks::LOWER_LIP] = Point::new(0.50, 0.70);
        face
    }

    #[test]
    fn analyze_is_pure() {
        let pipeline = FrameAnalysisPipeline::default();
        let face = smiling_face();

        let first = pipeline.analyze(&face).unwrap();
        let second = pipeline.analyze(&face).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, (Emotion::Disgust, ActionUnitSet::of(&[ActionUnit::Au12])));
        assert!(pipeline.log().is_empty());
    }

    #[test]
    fn frames_without_face_leave_gaps() {
        let face = smiling_face();
        let frames = vec![Some(face.clone()), None, Some(face.clone()), None, Some(face)];

        let mut pipeline = FrameAnalysisPipeline::default();
        pipeline.run(frames);
        let report = pipeline.finish();

        let indices: Vec<usize> = report.log.iter().map(|r| r.frame_index()).collect();
        assert_eq!(indices, vec![0, 2, 4]);
        assert_eq!(report.stats.frames_seen, 5);
        assert_eq!(report.stats.no_face, 2);
        assert_eq!(report.stats.failed, 0);
    }

    #[test]
    fn malformed_frame_is_counted_and_skipped() {
        let mut short = smiling_face();
        short.points.truncate(landmarks::EYE_INNER);

        let mut pipeline = FrameAnalysisPipeline::default();
        let outcome = pipeline.process_frame(0, Some(&short));
        assert!(matches!(
            outcome,
            FrameOutcome::Failed(Error::InvalidLandmarkSet { index: 386, .. })
        ));
        assert_eq!(pipeline.stats().failed, 1);

        let outcome = pipeline.process_frame(1, Some(&smiling_face()));
        assert!(matches!(outcome, FrameOutcome::Recorded(_)));
        assert_eq!(pipeline.log().len(), 1);
        assert_eq!(pipeline.stats().analyzed, 1);
    }

    #[test]
    fn run_continues_frame_numbering() {
        let mut pipeline = FrameAnalysisPipeline::default();
        pipeline.run(vec![None, Some(smiling_face())]);
        pipeline.run(vec![Some(smiling_face())]);

        let indices: Vec<usize> = pipeline.log().iter().map(|r| r.frame_index()).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn repeated_frame_index_fails_without_recording() {
        let face = smiling_face();
        let mut pipeline = FrameAnalysisPipeline::default();

        assert!(matches!(pipeline.process_frame(3, Some(&face)), FrameOutcome::Recorded(_)));
        let outcome = pipeline.process_frame(3, Some(&face));
        assert!(matches!(
            outcome,
            FrameOutcome::Failed(Error::OutOfOrderFrame { index: 3, next: 4 })
        ));
        let outcome = pipeline.process_frame(1, None::<&LandmarkSet>);
        assert!(matches!(outcome, FrameOutcome::Failed(Error::OutOfOrderFrame { index: 1, .. })));

        assert_eq!(pipeline.log().len(), 1);
        assert_eq!(pipeline.stats().failed, 2);
        assert_eq!(pipeline.stats().frames_seen, 3);
        assert_eq!(pipeline.next_frame(), 4);

        pipeline.process_frame(5, Some(&face));
        let indices: Vec<usize> = pipeline.log().iter().map(|r| r.frame_index()).collect();
        assert_eq!(indices, vec![3, 5]);
        assert_eq!(pipeline.log().get(5).map(|r| r.frame_index()), Some(5));
    }

    #[test]
    fn run_continues_after_explicit_index() {
        let face = smiling_face();
        let mut pipeline = FrameAnalysisPipeline::default();

        pipeline.process_frame(10, Some(&face));
        pipeline.run(vec![None, Some(face)]);

        let indices: Vec<usize> = pipeline.log().iter().map(|r| r.frame_index()).collect();
        assert_eq!(indices, vec![10, 12]);
        assert_eq!(pipeline.stats().failed, 0);
        assert_eq!(pipeline.next_frame(), 13);
    }

    #[test]
    fn log_lookup_by_frame() {
        let mut pipeline = FrameAnalysisPipeline::default();
        pipeline.run(vec![None, Some(smiling_face()), None]);

        assert!(pipeline.log().get(0).is_none());
        assert_eq!(pipeline.log().get(1).map(|r| r.emotion()), Some(Emotion::Disgust));
        assert_eq!(pipeline.log().count(Emotion::Disgust), 1);
    }

    #[test]
    fn record_display() {
        let record = FrameRecord::new(
            7,
            Emotion::Happiness,
            ActionUnitSet::of(&[ActionUnit::Au12, ActionUnit::Au26]),
        );
        assert_eq!(record.to_string(), "frame 7: Happiness [AU12, AU26]");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_matches_sequential() {
        let mut short = smiling_face();
        short.points.truncate(100);
        let frames: Vec<Option<LandmarkSet>> = (0..64)
            .map(|i| match i % 4 {
                0 => None,
                1 => Some(short.clone()),
                _ => Some(smiling_face()),
            })
            .collect();

        let mut sequential = FrameAnalysisPipeline::default();
        sequential.run(frames.clone());

        let mut parallel = FrameAnalysisPipeline::default();
        parallel.run_parallel(&frames);

        assert_eq!(sequential.finish(), parallel.finish());
    }
}

//! # facs-emotion
//!
//! Rule-based facial expression classification from facial landmarks.
//!
//! This crate provides:
//! - **Action Unit Extraction**: five geometric predicates approximating FACS
//!   action units (AU1, AU4, AU12, AU15, AU26) from normalized landmarks
//! - **Emotion Classification**: an ordered, first-match-wins rule table
//!   mapping active action units to one emotion label
//! - **Frame Analysis**: a per-frame pipeline producing an ordered log of
//!   frame records, plus frequency summaries for reporting
//!
//! Landmarks come from an external face mesh detector using the canonical
//! 468-point indexing scheme, with `x` and `y` normalized to the image and
//! `y` increasing downward. Only eight landmarks are read: 13, 14, 17, 61,
//! 65, 159, 291 and 386.
//!
//! Every frame is analyzed independently. There is no smoothing across
//! frames; the thresholds are tuned for single-frame behavior.
//!
//! ## Action Units
//!
//! | AU | Measurement | Active when |
//! |----|-------------|-------------|
//! | AU1 inner brow raise | `65.y - 159.y` | `< -0.02` |
//! | AU4 brow lowerer | `65.y - 386.y` | `> 0.02` |
//! | AU12 lip corner pull | `\|291.x - 61.x\|` | `> 0.35` |
//! | AU15 lip corner depressor | `61.y - 17.y` | `> 0.05` |
//! | AU26 jaw drop | `14.y - 13.y` | `> 0.03` |
//!
//! ## Classification
//!
//! 1. AU1 and AU26 → Surprise
//! 2. AU1, AU4 and AU15 → Sadness
//! 3. AU4 and AU26 → Anger
//! 4. AU12 alone → Disgust
//! 5. AU12 → Happiness
//! 6. otherwise → Neutral
//!
//! ## Quick Start
//!
//! ```rust
//! use facs_emotion::{
//!     landmarks, ActionUnitExtractor, Emotion, FrameAnalysisPipeline, LandmarkSet, Point,
//!     FACE_MESH_LANDMARKS,
//! };
//!
//! // Landmarks as delivered by the face mesh detector
//! let mut face = LandmarkSet::zeros(FACE_MESH_LANDMARKS);
//! face[landmarks::MOUTH_LEFT] = Point::new(0.30, 0.70);
//! face[landmarks::MOUTH_RIGHT] = Point::new(0.70, 0.70);
//! face[landmarks::CHIN] = Point::new(0.50, 0.85);
//!
//! let mut pipeline = FrameAnalysisPipeline::new(ActionUnitExtractor::default());
//!
//! // Live use: label a single face
//! let (emotion, active) = pipeline.analyze(&face).unwrap();
//! assert_eq!(emotion, Emotion::Disgust);
//! println!("{} [{}]", emotion, active);
//!
//! // Session use: frames without a face are `None`
//! pipeline.run(vec![Some(face.clone()), None, Some(face)]);
//! let report = pipeline.finish();
//! assert_eq!(report.log.len(), 2);
//! ```
//!
//! ## Custom Landmark Containers
//!
//! Implement the [`LandmarkAccess`] trait to analyze landmarks held in your
//! own types:
//!
//! ```rust
//! use facs_emotion::{LandmarkAccess, Point};
//!
//! struct MeshFrame { /* ... */ }
//!
//! impl LandmarkAccess for MeshFrame {
//!     fn landmark(&self, index: usize) -> Option<Point> {
//!         // Return None for indices the mesh does not contain
//!         None
//!     }
//!     fn num_landmarks(&self) -> usize { 468 }
//! }
//! ```

mod config;
mod error;
mod features;
mod pipeline;
pub mod recording;
pub mod render;
pub mod rules;
mod summary;
mod types;

pub use config::Thresholds;
pub use error::{Error, Result};
pub use features::{
    detect_au1, detect_au12, detect_au15, detect_au26, detect_au4, measure, ActionUnitExtractor,
    ActionUnitMeasurements, LandmarkAccess,
};
pub use pipeline::{
    AnalysisLog, AnalysisReport, FrameAnalysisPipeline, FrameOutcome, FrameRecord, FrameStats,
};
pub use recording::LandmarkRecording;
pub use rules::{classify, Rule};
pub use summary::EmotionSummary;
pub use types::{
    landmarks, ActionUnit, ActionUnitSet, Emotion, LandmarkSet, Point, FACE_MESH_LANDMARKS,
};

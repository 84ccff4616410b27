//! Persisted landmark streams.
//!
//! A recording is the per-frame output of an external landmark detector:
//! one entry per decoded video frame, `None` where no face was found.
//! Both front ends read recordings instead of decoding video themselves.
//!
//! # Formats
//!
//! The format is chosen from the file extension:
//! - `.json` - serde_json
//! - `.bin` - bincode
//!
//! Either may carry an extra `.bz2` suffix for bzip2 compression.
//!
//! ```ignore
//! use facs_emotion::LandmarkRecording;
//!
//! let recording = LandmarkRecording::load("session.json.bz2")?;
//! println!("{} frames", recording.num_frames());
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::LandmarkSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    Bincode,
}

/// Encoding and compression derived from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format {
    encoding: Encoding,
    compressed: bool,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?
            .to_ascii_lowercase();

        let (stem, compressed) = match name.strip_suffix(".bz2") {
            Some(stem) => (stem, true),
            None => (name.as_str(), false),
        };

        let encoding = if stem.ends_with(".json") {
            Encoding::Json
        } else if stem.ends_with(".bin") {
            Encoding::Bincode
        } else {
            return Err(Error::UnsupportedFormat(format!(
                "{} (expected .json, .bin, optionally with .bz2)",
                path.display()
            )));
        };

        Ok(Self {
            encoding,
            compressed,
        })
    }
}

/// A sequence of per-frame landmark sets captured from one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecording {
    /// Where the frames came from (usually the video file name).
    #[serde(default)]
    pub source: Option<String>,

    /// Frame rate of the source video, if known.
    #[serde(default)]
    pub frame_rate: Option<f32>,

    /// One entry per decoded frame; `None` where no face was detected.
    pub frames: Vec<Option<LandmarkSet>>,
}

impl LandmarkRecording {
    pub fn new(frames: Vec<Option<LandmarkSet>>) -> Self {
        Self {
            source: None,
            frame_rate: None,
            frames,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of frames in which a face was detected.
    pub fn num_faces(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    /// Number of detected faces missing a landmark the extractor reads.
    pub fn num_incomplete(&self) -> usize {
        self.frames
            .iter()
            .flatten()
            .filter(|face| !face.covers_required())
            .count()
    }

    /// Timestamp of a frame in seconds, when the frame rate is known.
    pub fn timestamp(&self, frame_index: usize) -> Option<f32> {
        self.frame_rate
            .filter(|fps| *fps > 0.0)
            .map(|fps| frame_index as f32 / fps)
    }

    /// Load a recording, choosing the decoder from the file extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let file = BufReader::new(File::open(path)?);

        let recording = if format.compressed {
            Self::read_from(BzDecoder::new(file), format.encoding)?
        } else {
            Self::read_from(file, format.encoding)?
        };

        let incomplete = recording.num_incomplete();
        if incomplete > 0 {
            warn!(
                "{}: {} of {} faces lack required landmarks and will be skipped",
                path.display(),
                incomplete,
                recording.num_faces()
            );
        }
        Ok(recording)
    }

    /// Save a recording, choosing the encoder from the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let file = BufWriter::new(File::create(path)?);

        if format.compressed {
            let mut encoder = BzEncoder::new(file, Compression::best());
            self.write_to(&mut encoder, format.encoding)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = file;
            self.write_to(&mut writer, format.encoding)?;
            writer.flush()?;
        }
        Ok(())
    }

    fn read_from<R: Read>(reader: R, encoding: Encoding) -> Result<Self> {
        let recording: Self = match encoding {
            Encoding::Json => serde_json::from_reader(reader)?,
            Encoding::Bincode => bincode::deserialize_from(reader)?,
        };
        Ok(recording)
    }

    fn write_to<W: Write>(&self, writer: &mut W, encoding: Encoding) -> Result<()> {
        match encoding {
            Encoding::Json => serde_json::to_writer(writer, self)?,
            Encoding::Bincode => bincode::serialize_into(writer, self)?,
        }
        Ok(())
    }
}

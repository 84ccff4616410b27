//! Batch runner: classify every frame of a landmark recording.
//!
//! Usage:
//!   facs-emotion <recording>                       # Frame table and frequencies
//!   facs-emotion <recording> --json                # JSON report
//!   facs-emotion <recording> -o report.json --json # Save to file
//!   facs-emotion <recording> --overlay             # Per-frame labels as they are produced
//!   facs-emotion <recording> --chart freq.png      # Emotion frequency bar chart
//!   facs-emotion <recording> --measurements        # Raw AU measurements per frame

use clap::Parser;
use facs_emotion::{
    render, ActionUnit, ActionUnitExtractor, ActionUnitMeasurements, AnalysisReport, EmotionSummary, FrameAnalysisPipeline,
    FrameOutcome, FrameStats, LandmarkRecording, Thresholds,
};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "facs-emotion")]
#[command(author, version, about = "FACS action unit emotion mapping for landmark recordings", long_about = None)]
struct Args {
    /// Landmark recording (.json or .bin, optionally .bz2 compressed)
    #[arg(required = true)]
    recording: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file overriding action unit thresholds
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Write the emotion frequency bar chart to a PNG file
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Print each frame's label and action units as it is analyzed
    #[arg(long)]
    overlay: bool,

    /// Include the raw measurement behind each action unit
    #[arg(long)]
    measurements: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output<'a> {
    recording: String,
    source: Option<&'a str>,
    stats: FrameStats,
    frames: Vec<FrameOutput>,
    summary: &'a EmotionSummary,
}

#[derive(Serialize)]
struct FrameOutput {
    frame: usize,
    /// Seconds from the start of the video, when the frame rate is known
    timestamp: Option<f32>,
    emotion: String,
    action_units: Vec<ActionUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    measurements: Option<ActionUnitMeasurements>,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let thresholds = match args.thresholds {
        Some(ref path) => {
            info!("Loading thresholds from {:?}", path);
            Thresholds::load(path)?
        }
        None => Thresholds::default(),
    };

    info!("Loading recording {:?}", args.recording);
    let recording = LandmarkRecording::load(&args.recording)?;
    info!(
        "{} frames, {} with a detected face, {} incomplete",
        recording.num_frames(),
        recording.num_faces(),
        recording.num_incomplete()
    );

    let extractor = ActionUnitExtractor::new(thresholds);
    let report = analyze(&recording, extractor, args.overlay);
    let summary = EmotionSummary::from_log(&report.log);

    if let Some(ref path) = args.chart {
        let chart = render::frequency_chart(&summary, 640, 400);
        render::save_png(&chart, path)?;
        info!("Chart written to {:?}", path);
    }

    let frames = report
        .log
        .iter()
        .map(|r| FrameOutput {
            frame: r.frame_index(),
            timestamp: recording.timestamp(r.frame_index()),
            emotion: r.emotion().to_string(),
            action_units: r.active_units().iter().collect(),
            measurements: if args.measurements {
                recording
                    .frames
                    .get(r.frame_index())
                    .and_then(|frame| frame.as_ref())
                    .and_then(|face| extractor.measure_all(face).ok())
            } else {
                None
            },
        })
        .collect();

    let output = Output {
        recording: args.recording.display().to_string(),
        source: recording.source.as_deref(),
        stats: report.stats,
        frames,
        summary: &summary,
    };

    // Generate output
    let output_str = if args.json {
        serde_json::to_string_pretty(&output)?
    } else {
        format_human_readable(&output)
    };

    // Write output
    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        info!("Output written to {:?}", path);
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn analyze(recording: &LandmarkRecording, extractor: ActionUnitExtractor, overlay: bool) -> AnalysisReport {
    let mut pipeline = FrameAnalysisPipeline::new(extractor);

    if overlay {
        for (frame_index, frame) in recording.frames.iter().enumerate() {
            if let FrameOutcome::Recorded(record) = pipeline.process_frame(frame_index, frame.as_ref()) {
                eprintln!("{}", record);
            }
        }
    } else {
        pipeline.run(recording.frames.iter().cloned());
    }

    pipeline.finish()
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();

    s.push_str(&format!("Recording: {}\n", output.recording));
    if let Some(source) = output.source {
        s.push_str(&format!("Source: {}\n", source));
    }
    s.push_str(&format!(
        "Frames: {} ({} analyzed, {} without a face, {} failed)\n",
        output.stats.frames_seen, output.stats.analyzed, output.stats.no_face, output.stats.failed
    ));

    if output.frames.is_empty() {
        s.push_str("\nNo faces found.\n");
        return s;
    }

    s.push_str("\nAction Units Mapping Frames:\n");
    s.push_str(&format!("  {:>6}  {:<10} {}\n", "Frame", "Emotion", "Detected AUs"));
    for frame in &output.frames {
        let units: Vec<&str> = frame.action_units.iter().map(|u| u.code()).collect();
        s.push_str(&format!(
            "  {:>6}  {:<10} {}\n",
            frame.frame,
            frame.emotion,
            units.join(", ")
        ));
        if let Some(m) = frame.measurements {
            s.push_str(&format!(
                "  {:>6}  AU1 {:+.3}  AU4 {:+.3}  AU12 {:+.3}  AU15 {:+.3}  AU26 {:+.3}\n",
                "", m.au1, m.au4, m.au12, m.au15, m.au26
            ));
        }
    }

    let summary = output.summary;
    s.push_str("\nEmotion Mapping Frequency:\n");
    s.push_str(&format!("  Total frames analyzed: {}\n", summary.total_frames));
    for (emotion, count) in &summary.emotion_counts {
        s.push_str(&format!(
            "  {:<10} {:>6}  ({:.1}%)\n",
            emotion.as_str(),
            count,
            summary.percentage(*emotion)
        ));
    }

    s.push_str("\nAction Unit Frequency:\n");
    for (unit, count) in &summary.unit_counts {
        s.push_str(&format!(
            "  {:<5} {:<22} {:>6}  ({:.1}%)\n",
            unit.code(),
            unit.name(),
            count,
            summary.unit_percentage(*unit)
        ));
    }

    s
}

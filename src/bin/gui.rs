//! Interactive session viewer for landmark recordings.
//!
//! Run with: cargo run --features gui --bin facs-emotion-gui

use eframe::egui;
use facs_emotion::{
    render, rules, ActionUnit, ActionUnitExtractor, AnalysisReport, EmotionSummary,
    FrameAnalysisPipeline, LandmarkRecording, Thresholds,
};
use std::path::PathBuf;

const OVERLAY_SIZE: u32 = 480;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "FACS Action Units Emotion Mapper",
        options,
        Box::new(|cc| Ok(Box::new(SessionApp::new(cc)))),
    )
}

struct SessionApp {
    // Input state
    recording: Option<LandmarkRecording>,
    recording_path: String,
    thresholds_path: String,
    thresholds: Thresholds,

    // Session results
    report: Option<AnalysisReport>,
    summary: Option<EmotionSummary>,

    // Frame browser
    current_frame: usize,
    overlay_texture: Option<egui::TextureHandle>,
    overlay_frame: Option<usize>,
    frame_status: String,

    status: String,
}

impl SessionApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            recording: None,
            recording_path: String::new(),
            thresholds_path: String::new(),
            thresholds: Thresholds::default(),
            report: None,
            summary: None,
            current_frame: 0,
            overlay_texture: None,
            overlay_frame: None,
            frame_status: String::new(),
            status: "Open a landmark recording to begin".to_string(),
        }
    }

    fn pipeline(&self) -> FrameAnalysisPipeline {
        FrameAnalysisPipeline::new(ActionUnitExtractor::new(self.thresholds))
    }

    fn load_recording(&mut self, path: PathBuf) {
        match LandmarkRecording::load(&path) {
            Ok(recording) => {
                self.status = format!(
                    "Loaded: {} ({} frames, {} with a face)",
                    path.display(),
                    recording.num_frames(),
                    recording.num_faces()
                );
                self.recording = Some(recording);
                self.recording_path = path.display().to_string();
                self.report = None;
                self.summary = None;
                self.current_frame = 0;
                self.overlay_frame = None;
            }
            Err(e) => {
                self.status = format!("Failed to load recording: {}", e);
            }
        }
    }

    fn load_thresholds(&mut self) {
        match Thresholds::load(&self.thresholds_path) {
            Ok(thresholds) => {
                self.thresholds = thresholds;
                self.report = None;
                self.summary = None;
                self.overlay_frame = None;
                self.status = "Thresholds loaded".to_string();
            }
            Err(e) => {
                self.status = format!("Failed to load thresholds: {}", e);
            }
        }
    }

    fn analyze_session(&mut self) {
        let Some(ref recording) = self.recording else {
            self.status = "No recording loaded".to_string();
            return;
        };

        let mut pipeline = self.pipeline();
        pipeline.run(recording.frames.iter().cloned());
        let report = pipeline.finish();

        self.status = format!(
            "Processing complete: {} frames analyzed",
            report.stats.analyzed
        );
        self.summary = Some(EmotionSummary::from_log(&report.log));
        self.report = Some(report);
    }

    /// Re-render the overlay when the selected frame changes.
    fn update_overlay(&mut self, ctx: &egui::Context) {
        if self.overlay_frame == Some(self.current_frame) {
            return;
        }
        self.overlay_frame = Some(self.current_frame);
        self.overlay_texture = None;

        let Some(ref recording) = self.recording else {
            return;
        };

        let Some(Some(face)) = recording.frames.get(self.current_frame) else {
            self.frame_status = "No face detected".to_string();
            return;
        };

        match self.pipeline().analyze(face) {
            Ok((emotion, active)) => {
                self.frame_status = format!("{} [{}]", emotion, active);

                let rgba = render::render_overlay(face, emotion, active, OVERLAY_SIZE, OVERLAY_SIZE);
                let size = [rgba.width() as usize, rgba.height() as usize];
                let pixels: Vec<egui::Color32> = rgba
                    .pixels()
                    .map(|p| egui::Color32::from_rgba_unmultiplied(p[0], p[1], p[2], p[3]))
                    .collect();

                let color_image = egui::ColorImage { size, pixels };
                self.overlay_texture =
                    Some(ctx.load_texture("overlay", color_image, Default::default()));
            }
            Err(e) => {
                self.frame_status = format!("Frame skipped: {}", e);
            }
        }
    }

    fn frame_table(&self, ui: &mut egui::Ui) {
        let Some(ref report) = self.report else {
            ui.label("Run the analysis to fill the frame table.");
            return;
        };

        egui::ScrollArea::vertical()
            .id_salt("frames")
            .max_height(300.0)
            .show(ui, |ui| {
                egui::Grid::new("frame_table").striped(true).show(ui, |ui| {
                    ui.strong("Frame");
                    ui.strong("Emotion");
                    ui.strong("Detected AUs");
                    ui.end_row();

                    for record in &report.log {
                        ui.label(record.frame_index().to_string());
                        ui.label(record.emotion().as_str());
                        ui.label(record.active_units().to_string());
                        ui.end_row();
                    }
                });
            });
    }

    fn frequency_bars(&self, ui: &mut egui::Ui) {
        let Some(ref summary) = self.summary else {
            return;
        };

        ui.label(format!("Total frames analyzed: {}", summary.total_frames));
        let max = summary.max_count().max(1) as f32;
        for (emotion, count) in &summary.emotion_counts {
            let [r, g, b] = emotion.color();
            ui.add(
                egui::ProgressBar::new(*count as f32 / max)
                    .fill(egui::Color32::from_rgb(r, g, b))
                    .text(format!(
                        "{}: {} ({:.1}%)",
                        emotion,
                        count,
                        summary.percentage(*emotion)
                    )),
            );
        }
    }
}

fn reference_table(ui: &mut egui::Ui) {
    egui::Grid::new("reference").striped(true).show(ui, |ui| {
        ui.strong("Emotion");
        ui.strong("Key Action Units");
        ui.end_row();

        for rule in rules::RULES.iter() {
            let units: Vec<String> = rule
                .requires
                .iter()
                .map(|u| format!("{} ({})", u, u.name()))
                .collect();
            let mut text = units.join(", ");
            if rule.exact_count.is_some() {
                text.push_str(" - isolated");
            }
            ui.label(rule.emotion.as_str());
            ui.label(text);
            ui.end_row();
        }

        let all: Vec<&str> = ActionUnit::ALL.iter().map(|u| u.code()).collect();
        ui.label(rules::FALLBACK.as_str());
        ui.label(format!("None of {}", all.join(", ")));
        ui.end_row();
    });
}

impl eframe::App for SessionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Recording...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Landmark recordings", &["json", "bin", "bz2"])
                            .pick_file()
                        {
                            self.load_recording(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        egui::SidePanel::left("controls").min_width(260.0).show(ctx, |ui| {
            ui.heading("Recording");
            ui.separator();

            ui.text_edit_singleline(&mut self.recording_path);
            if ui.button("Load Recording").clicked() {
                let path = PathBuf::from(&self.recording_path);
                self.load_recording(path);
            }
            ui.add_space(8.0);

            ui.label("Thresholds (JSON):");
            ui.text_edit_singleline(&mut self.thresholds_path);
            if ui.button("Load Thresholds").clicked() {
                self.load_thresholds();
            }
            ui.add_space(16.0);

            ui.heading("Analysis");
            ui.separator();
            if ui.button("Analyze Session").clicked() {
                self.analyze_session();
            }
            if let Some(ref report) = self.report {
                ui.label(format!("Frames: {}", report.stats.frames_seen));
                ui.label(format!("Analyzed: {}", report.stats.analyzed));
                ui.label(format!("Without a face: {}", report.stats.no_face));
                ui.label(format!("Failed: {}", report.stats.failed));
            }
            ui.add_space(16.0);

            ui.heading("Status");
            ui.separator();
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let num_frames = self.recording.as_ref().map_or(0, |r| r.num_frames());
            if num_frames == 0 {
                ui.centered_and_justified(|ui| {
                    ui.heading("Drag and drop a recording or use File > Open");
                });
                return;
            }

            self.update_overlay(ctx);

            ui.columns(2, |columns| {
                let left = &mut columns[0];
                left.heading("Frame Preview");
                left.add(
                    egui::Slider::new(&mut self.current_frame, 0..=num_frames - 1).text("Frame"),
                );
                left.label(&self.frame_status);
                if let Some(ref texture) = self.overlay_texture {
                    let available = left.available_width();
                    let scale = (available / texture.size_vec2().x).min(1.0);
                    left.image((texture.id(), texture.size_vec2() * scale));
                }

                let right = &mut columns[1];
                right.heading("Action Units Mapping Frames");
                self.frame_table(right);
                right.add_space(12.0);
                right.heading("Emotion Mapping Frequency");
                self.frequency_bars(right);
                right.add_space(12.0);
                right.heading("Action Units to Emotion Mapping Reference");
                reference_table(right);
            });
        });

        // Handle drag and drop
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            self.load_recording(path);
        }
    }
}

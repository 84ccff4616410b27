//! Raster output for the front ends: landmark overlays and the emotion
//! frequency chart.

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::Result;
use crate::summary::EmotionSummary;
use crate::types::{landmarks, ActionUnit, ActionUnitSet, Emotion, LandmarkSet, Point};

const BACKGROUND: Rgba<u8> = Rgba([24, 24, 28, 255]);
const MESH: Rgba<u8> = Rgba([90, 90, 100, 255]);
const INACTIVE: Rgba<u8> = Rgba([160, 160, 170, 255]);
const AXIS: Rgba<u8> = Rgba([200, 200, 200, 255]);

/// How far outside the canvas a landmark may be placed before it is clamped.
const MARGIN: i32 = 16;

fn emotion_color(emotion: Emotion) -> Rgba<u8> {
    let [r, g, b] = emotion.color();
    Rgba([r, g, b, 255])
}

/// Draw one face onto a blank canvas.
///
/// Every landmark is drawn as a dim dot. The landmark pairs the action
/// units are measured between are joined by a line, drawn in the
/// emotion's color when that unit is active.
pub fn render_overlay(
    face: &LandmarkSet,
    emotion: Emotion,
    active: ActionUnitSet,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, BACKGROUND);
    let to_pixel = |index: usize| face.get(index).map(|p| canvas_pixel(p, width, height));

    for p in &face.points {
        let (x, y) = canvas_pixel(p, width, height);
        draw_circle(&mut img, x, y, 1, MESH);
    }

    let highlight = emotion_color(emotion);
    for unit in ActionUnit::ALL {
        let (a, b) = unit.landmark_pair();
        let (Some((x0, y0)), Some((x1, y1))) = (to_pixel(a), to_pixel(b)) else {
            continue;
        };
        let color = if active.contains(unit) { highlight } else { INACTIVE };
        draw_line(&mut img, x0, y0, x1, y1, color);
    }

    for index in landmarks::REQUIRED {
        if let Some((x, y)) = to_pixel(index) {
            draw_circle(&mut img, x, y, 3, highlight);
        }
    }

    // Border in the label color.
    draw_rect(&mut img, 0, 0, width as i32, height as i32, highlight);
    img
}

/// Bar chart of label counts, one bar per emotion in label order.
pub fn frequency_chart(summary: &EmotionSummary, width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, BACKGROUND);

    let margin = (width.min(height) / 10) as i32;
    let plot_w = width as i32 - 2 * margin;
    let plot_h = height as i32 - 2 * margin;
    let baseline = height as i32 - margin;

    if plot_w <= 0 || plot_h <= 0 {
        return img;
    }

    let slot = plot_w / Emotion::ALL.len() as i32;
    let bar_w = (slot * 2 / 3).max(1);
    let max_count = summary.max_count();

    for (i, emotion) in Emotion::ALL.iter().enumerate() {
        let count = summary.count(*emotion);
        if count == 0 || max_count == 0 {
            continue;
        }
        let bar_h = ((count as f32 / max_count as f32) * plot_h as f32).round() as i32;
        let x = margin + i as i32 * slot + (slot - bar_w) / 2;
        fill_rect(&mut img, x, baseline - bar_h, bar_w, bar_h, emotion_color(*emotion));
    }

    draw_line(&mut img, margin, baseline, margin + plot_w, baseline, AXIS);
    draw_line(&mut img, margin, baseline, margin, baseline - plot_h, AXIS);
    img
}

pub fn save_png<P: AsRef<Path>>(img: &RgbaImage, path: P) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

// Drawing helpers

/// Pixel position of a landmark, clamped to the canvas plus [`MARGIN`].
/// Non-finite coordinates land on the origin.
fn canvas_pixel(p: &Point, width: u32, height: u32) -> (i32, i32) {
    let (x, y) = p.to_pixel(width, height);
    (clamp_axis(x, width), clamp_axis(y, height))
}

fn clamp_axis(value: f32, size: u32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let max = size.min(i32::MAX as u32 - MARGIN as u32) as i32 + MARGIN;
    value.clamp(-MARGIN as f32, max as f32) as i32
}

fn put(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    let (img_w, img_h) = img.dimensions();
    if x >= 0 && x < img_w as i32 && y >= 0 && y < img_h as i32 {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
    for dy in 0..h {
        for dx in 0..w {
            put(img, x + dx, y + dy, color);
        }
    }
}

fn draw_rect(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
    for dx in 0..w {
        put(img, x + dx, y, color);
        put(img, x + dx, y + h - 1, color);
    }
    for dy in 0..h {
        put(img, x, y + dy, color);
        put(img, x + w - 1, y + dy, color);
    }
}

fn draw_circle(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line.
fn draw_line(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        put(img, x, y, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FrameAnalysisPipeline;
    use crate::types::{Point, FACE_MESH_LANDMARKS};

    #[test]
    fn overlay_marks_required_landmarks() {
        let mut face = LandmarkSet::zeros(FACE_MESH_LANDMARKS);
        face[landmarks::UPPER_LIP] = Point::new(0.5, 0.5);

        let active = ActionUnitSet::of(&[ActionUnit::Au26]);
        let img = render_overlay(&face, Emotion::Anger, active, 100, 100);

        assert_eq!(img.dimensions(), (100, 100));
        assert_eq!(*img.get_pixel(50, 50), emotion_color(Emotion::Anger));
        assert_eq!(*img.get_pixel(99, 50), emotion_color(Emotion::Anger));
        assert_eq!(*img.get_pixel(70, 20), BACKGROUND);
    }

    #[test]
    fn overlay_tolerates_short_sets() {
        let face = LandmarkSet::new(vec![Point::new(0.5, 0.5)]);
        let img = render_overlay(&face, Emotion::Neutral, ActionUnitSet::empty(), 10, 10);
        assert_eq!(img.dimensions(), (10, 10));
    }

    #[test]
    fn overlay_clamps_extreme_coordinates() {
        let mut face = LandmarkSet::zeros(FACE_MESH_LANDMARKS);
        face[landmarks::MOUTH_LEFT] = Point::new(-1.0e12, 0.5);
        face[landmarks::MOUTH_RIGHT] = Point::new(1.0e12, 0.5);
        face[landmarks::UPPER_LIP] = Point::new(f32::NAN, 0.5);
        face[landmarks::CHIN] = Point::new(f32::INFINITY, f32::NEG_INFINITY);

        let active = ActionUnitSet::of(&[ActionUnit::Au12]);
        let img = render_overlay(&face, Emotion::Happiness, active, 50, 50);
        assert_eq!(img.dimensions(), (50, 50));
        // The AU12 line from the far left still crosses the canvas.
        assert_eq!(*img.get_pixel(25, 25), emotion_color(Emotion::Happiness));
    }

    #[test]
    fn pixels_clamp_to_margin() {
        assert_eq!(canvas_pixel(&Point::new(0.5, 0.25), 100, 100), (50, 25));
        assert_eq!(canvas_pixel(&Point::new(-5.0, 5.0), 100, 100), (-MARGIN, 100 + MARGIN));
        assert_eq!(canvas_pixel(&Point::new(f32::NAN, f32::NEG_INFINITY), 100, 100), (0, 0));
    }

    #[test]
    fn chart_draws_tallest_bar_to_full_height() {
        let mut face = LandmarkSet::zeros(FACE_MESH_LANDMARKS);
        face[landmarks::MOUTH_LEFT] = Point::new(0.3, 0.7);
        face[landmarks::MOUTH_RIGHT] = Point::new(0.7, 0.7);
        face[landmarks::CHIN] = Point::new(0.5, 0.9);

        let mut pipeline = FrameAnalysisPipeline::default();
        pipeline.run(vec![Some(face)]);
        let summary = EmotionSummary::from_log(pipeline.log());
        assert_eq!(summary.dominant(), Some(Emotion::Disgust));

        let img = frequency_chart(&summary, 600, 400);
        // Disgust is the fifth slot: margin 40, plot 520 wide, slot 86.
        let x = 40 + 4 * 86 + 43;
        assert_eq!(*img.get_pixel(x as u32, 50), emotion_color(Emotion::Disgust));
        // Surprise never occurred, so its slot stays empty.
        assert_eq!(*img.get_pixel(40 + 43, 300), BACKGROUND);
    }

    #[test]
    fn empty_summary_chart() {
        let img = frequency_chart(&EmotionSummary::default(), 60, 40);
        assert_eq!(img.dimensions(), (60, 40));
    }
}

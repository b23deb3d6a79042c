//! Presentation overlay
//!
//! Draws the gesture indicator panel and the FPS readout onto a frame before
//! it is encoded for the live view. Text uses a built-in 5x7 bitmap font.

use image::{imageops, Rgb, RgbImage};

use crate::config::OverlayConfig;
use crate::types::{GestureSnapshot, Posture};

const PANEL_X: i32 = 10;
const PANEL_Y: i32 = 30;
const ROW_SPACING: i32 = 35;
const BOX_WIDTH: i32 = 250;
const TEXT_SCALE: i32 = 2;

const INACTIVE_FILL: Rgb<u8> = Rgb([50, 50, 50]);
const ACTIVE_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const INACTIVE_TEXT: Rgb<u8> = Rgb([150, 150, 150]);
const FPS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// One row of the indicator panel
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub label: String,
    pub active: bool,
    pub color: Rgb<u8>,
}

/// The six panel rows for a snapshot, top to bottom
pub fn indicators(snapshot: &GestureSnapshot) -> Vec<Indicator> {
    let row = |label: &str, active: bool, color: [u8; 3]| Indicator {
        label: label.to_string(),
        active,
        color: Rgb(color),
    };
    vec![
        row("Smile", snapshot.smile, [0, 255, 0]),
        row("Eye Contact", snapshot.eye_contact, [255, 255, 0]),
        row("Thumbs Up", snapshot.thumbs_up, [0, 200, 255]),
        row("Wave", snapshot.wave, [0, 150, 255]),
        row("Thinking", snapshot.thinking, [255, 100, 200]),
        row(
            &format!("Posture: {}", snapshot.posture.as_str()),
            snapshot.posture == Posture::Confident,
            [255, 200, 100],
        ),
    ]
}

/// Render the indicator panel (blended) and, when known, the FPS readout
pub fn draw_overlay(
    frame: &mut RgbImage,
    snapshot: &GestureSnapshot,
    fps: Option<f64>,
    config: &OverlayConfig,
) {
    if !config.enabled {
        return;
    }

    let rows = indicators(snapshot);
    if let Some((x0, y0, w, h)) = panel_bounds(frame, rows.len()) {
        // only the panel region is copied and blended
        let mut panel = imageops::crop_imm(&*frame, x0, y0, w, h).to_image();
        let (ox, oy) = (x0 as i32, y0 as i32);
        for (i, indicator) in rows.iter().enumerate() {
            let y_pos = PANEL_Y + i as i32 * ROW_SPACING - oy;
            let left = PANEL_X - ox;
            let fill = if indicator.active {
                indicator.color
            } else {
                INACTIVE_FILL
            };
            fill_rect(&mut panel, left, y_pos - 20, left + BOX_WIDTH, y_pos + 10, fill);

            let text = if indicator.active {
                ACTIVE_TEXT
            } else {
                INACTIVE_TEXT
            };
            let text_y = y_pos - 7 * TEXT_SCALE + 2;
            draw_label(&mut panel, left + 10, text_y, &indicator.label, text);
        }
        blend_at(frame, &panel, x0, y0, config.alpha);
    }

    if let Some(fps) = fps {
        let x = frame.width() as i32 - 150;
        draw_label(frame, x, PANEL_Y - 7 * TEXT_SCALE, &format!("FPS: {fps:.1}"), FPS_COLOR);
    }
}

/// Frame region covered by `rows` indicator boxes, clipped; `None` when off-frame
fn panel_bounds(frame: &RgbImage, rows: usize) -> Option<(u32, u32, u32, u32)> {
    let left = PANEL_X;
    let top = PANEL_Y - 20;
    let right = PANEL_X + BOX_WIDTH + 1;
    let bottom = PANEL_Y + (rows.saturating_sub(1)) as i32 * ROW_SPACING + 11;

    let right = right.min(frame.width() as i32);
    let bottom = bottom.min(frame.height() as i32);
    if left >= right || top >= bottom {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// `out = alpha * overlay + (1 - alpha) * base`, with `overlay` placed at `(x0, y0)`
fn blend_at(base: &mut RgbImage, overlay: &RgbImage, x0: u32, y0: u32, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for (x, y, src) in overlay.enumerate_pixels() {
        let dst = base.get_pixel_mut(x0 + x, y0 + y);
        if dst == src {
            continue;
        }
        for c in 0..3 {
            let mixed = alpha * src[c] as f32 + (1.0 - alpha) * dst[c] as f32;
            dst[c] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn fill_rect(image: &mut RgbImage, left: i32, top: i32, right: i32, bottom: i32, color: Rgb<u8>) {
    let width = image.width() as i32;
    let height = image.height() as i32;
    if width == 0 || height == 0 || right < 0 || bottom < 0 || left >= width || top >= height {
        return;
    }
    let left = left.clamp(0, width - 1);
    let right = right.clamp(0, width - 1);
    let top = top.clamp(0, height - 1);
    let bottom = bottom.clamp(0, height - 1);

    for y in top..=bottom {
        for x in left..=right {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn draw_label(image: &mut RgbImage, mut x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let width = image.width() as i32;
    let height = image.height() as i32;
    for ch in text.chars().flat_map(|c| c.to_uppercase()) {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                for col in 0..5 {
                    if (pattern >> (4 - col)) & 1 == 0 {
                        continue;
                    }
                    for dy in 0..TEXT_SCALE {
                        for dx in 0..TEXT_SCALE {
                            let px = x + col * TEXT_SCALE + dx;
                            let py = y + row as i32 * TEXT_SCALE + dy;
                            if px >= 0 && px < width && py >= 0 && py < height {
                                image.put_pixel(px as u32, py as u32, color);
                            }
                        }
                    }
                }
            }
        }
        x += 6 * TEXT_SCALE;
    }
}

fn glyph_bits(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0, 0b00110, 0b00110, 0, 0b00110, 0b00110, 0],
        '.' => [0, 0, 0, 0, 0, 0b00110, 0b00110],
        ' ' => [0; 7],
        _ => return None,
    };
    Some(rows)
}

//! Control readout overlay
//!
//! Draws `Steer`, `Throttle` and `Brake` values onto the composite with an
//! embedded 5x7 bitmap font.

use contracts::ControlCommand;
use image::{Rgb, RgbImage};

/// Readout colour (red)
pub const TEXT_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);

/// Left edge of every readout line
pub const TEXT_X: u32 = 10;

/// Baselines of the steer, throttle and brake lines
pub const BASELINES: [u32; 3] = [30, 60, 90];

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Advance per character, one column of spacing
const ADVANCE: u32 = GLYPH_W + 1;

/// 5x7 glyph rows, bit 4 is the leftmost column
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04],
        ':' => [0x00, 0x00, 0x04, 0x00, 0x00, 0x04, 0x00],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        'h' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11],
        'k' => [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12],
        'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'o' => [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E],
        'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10],
        't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        _ => return None,
    };
    Some(rows)
}

/// Readout lines in display order
pub fn readout_lines(command: &ControlCommand) -> [String; 3] {
    [
        format!("Steer: {:.2}", command.steer),
        format!("Throttle: {:.2}", command.throttle),
        format!("Brake: {:.2}", command.brake),
    ]
}

/// Draw `text` with its bottom edge on `baseline`
///
/// Pixels outside the image are clipped. Unknown characters advance the pen
/// without drawing.
pub fn draw_text(
    image: &mut RgbImage,
    x: u32,
    baseline: u32,
    text: &str,
    colour: Rgb<u8>,
    scale: u32,
) {
    let scale = scale.max(1);
    let top = baseline.saturating_sub(GLYPH_H * scale);
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let left = x + i as u32 * ADVANCE * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (0x10 >> col) != 0 {
                    fill_cell(image, left + col * scale, top + row as u32 * scale, scale, colour);
                }
            }
        }
    }
}

fn fill_cell(image: &mut RgbImage, x: u32, y: u32, size: u32, colour: Rgb<u8>) {
    let (width, height) = image.dimensions();
    for py in y..(y + size).min(height) {
        for px in x..(x + size).min(width) {
            image.put_pixel(px, py, colour);
        }
    }
}

/// Overlay steer / throttle / brake readouts at their fixed positions
pub fn overlay_readouts(image: &mut RgbImage, command: &ControlCommand, scale: u32) {
    for (line, baseline) in readout_lines(command).iter().zip(BASELINES) {
        draw_text(image, TEXT_X, baseline, line, TEXT_COLOUR, scale);
    }
}

//! Raster snapshot of the pump compliance grid embedded at the top of the
//! report.

use crate::inspection::domain::PumpStatus;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;

const COLUMNS: u32 = 5;
const TILE_WIDTH: u32 = 80;
const TILE_HEIGHT: u32 = 100;
const GAP: u32 = 16;
const PADDING: u32 = 16;

const GRID_HEADING: &str = "Compliance of your pumps";
const HEADING_SCALE: u32 = 3;
const HEADING_BLOCK: u32 = GLYPH_HEIGHT * HEADING_SCALE + 16;
const LABEL_SCALE: u32 = 2;
const LABEL_INSET: u32 = 6;

const BACKGROUND: Rgb<u8> = Rgb([249, 250, 251]);
const COMPLIANT: Rgb<u8> = Rgb([34, 197, 94]);
const NON_COMPLIANT: Rgb<u8> = Rgb([249, 115, 22]);
const MARK: Rgb<u8> = Rgb([0, 0, 0]);
const HEADING: Rgb<u8> = Rgb([31, 41, 55]);

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("no pumps to render")]
    Empty,
    #[error("failed to encode pump grid: {0}")]
    Encode(#[from] image::ImageError),
}

/// Pixel geometry of a rendered grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridLayout {
    width: u32,
    height: u32,
    grid_left: u32,
}

impl GridLayout {
    fn for_count(count: u32) -> Self {
        let columns = count.min(COLUMNS);
        let rows = count.div_ceil(COLUMNS);
        let grid_width = columns * TILE_WIDTH + (columns - 1) * GAP;
        let heading_width = text_width(GRID_HEADING, HEADING_SCALE);
        let width = 2 * PADDING + grid_width.max(heading_width);

        Self {
            width,
            height: 2 * PADDING + HEADING_BLOCK + rows * TILE_HEIGHT + (rows - 1) * GAP,
            grid_left: (width - grid_width) / 2,
        }
    }

    /// Top-left corner of the tile for the zero-based pump `index`.
    fn tile_origin(&self, index: u32) -> (u32, u32) {
        (
            self.grid_left + (index % COLUMNS) * (TILE_WIDTH + GAP),
            PADDING + HEADING_BLOCK + (index / COLUMNS) * (TILE_HEIGHT + GAP),
        )
    }
}

/// Renders a heading and one numbered tile per pump, five per row, as PNG
/// bytes.
pub fn render_pump_grid(statuses: &[PumpStatus]) -> Result<Vec<u8>, SnapshotError> {
    if statuses.is_empty() {
        return Err(SnapshotError::Empty);
    }

    let layout = GridLayout::for_count(statuses.len() as u32);
    let mut canvas = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);

    let heading_x = (layout.width - text_width(GRID_HEADING, HEADING_SCALE)) / 2;
    draw_text(&mut canvas, GRID_HEADING, heading_x, PADDING, HEADING_SCALE, HEADING);

    for (index, status) in statuses.iter().enumerate() {
        let (x, y) = layout.tile_origin(index as u32);
        draw_tile(&mut canvas, x, y, *status);

        let label = (index + 1).to_string();
        let label_x = x + TILE_WIDTH - LABEL_INSET - text_width(&label, LABEL_SCALE);
        draw_text(&mut canvas, &label, label_x, y + LABEL_INSET, LABEL_SCALE, MARK);
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(canvas).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

fn draw_tile(canvas: &mut RgbImage, x: u32, y: u32, status: PumpStatus) {
    let fill = match status {
        PumpStatus::Compliant => COMPLIANT,
        PumpStatus::NonCompliant => NON_COMPLIANT,
    };
    fill_rect(canvas, x, y, TILE_WIDTH, TILE_HEIGHT, fill);

    let cx = (x + TILE_WIDTH / 2) as i32;
    let cy = (y + TILE_HEIGHT / 2 + 6) as i32;
    match status {
        PumpStatus::Compliant => {
            stroke(canvas, (cx - 16, cy), (cx - 4, cy + 12), 4);
            stroke(canvas, (cx - 4, cy + 12), (cx + 18, cy - 14), 4);
        }
        PumpStatus::NonCompliant => {
            fill_rect(canvas, (cx - 3) as u32, (cy - 22) as u32, 6, 30, MARK);
            fill_rect(canvas, (cx - 3) as u32, (cy + 14) as u32, 6, 6, MARK);
        }
    }
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// 5x7 bitmap rows, most significant of the low five bits leftmost. Covers
/// the digits and the letters of the heading; anything else renders blank.
fn glyph(ch: char) -> [u8; GLYPH_HEIGHT as usize] {
    match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'c' => [0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110],
        'e' => [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'f' => [0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01000, 0b01000],
        'i' => [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
        'l' => [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'm' => [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
        'n' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'o' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        'p' => [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000],
        'r' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
        's' => [0b00000, 0b00000, 0b01110, 0b10000, 0b01110, 0b00001, 0b11110],
        'u' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b10011, 0b01101],
        'y' => [0b00000, 0b00000, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
        _ => [0; GLYPH_HEIGHT as usize],
    }
}

/// Rendered width of `text` with one blank column between glyphs.
fn text_width(text: &str, scale: u32) -> u32 {
    let glyphs = text.chars().count() as u32;
    if glyphs == 0 {
        return 0;
    }
    (glyphs * (GLYPH_WIDTH + 1) - 1) * scale
}

fn draw_text(canvas: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    for (position, ch) in text.chars().enumerate() {
        let left = x + position as u32 * (GLYPH_WIDTH + 1) * scale;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - column)) != 0 {
                    fill_rect(
                        canvas,
                        left + column * scale,
                        y + row as u32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
    }
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

/// Thick line made of square dabs along the segment.
fn stroke(canvas: &mut RgbImage, from: (i32, i32), to: (i32, i32), thickness: i32) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).max(1);
    let half = thickness / 2;
    for step in 0..=steps {
        let px = from.0 + (to.0 - from.0) * step / steps;
        let py = from.1 + (to.1 - from.1) * step / steps;
        for dy in -half..=half {
            for dx in -half..=half {
                let (x, y) = (px + dx, py + dy);
                if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                    canvas.put_pixel(x as u32, y as u32, MARK);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::images::RasterImage;

    fn render(statuses: &[PumpStatus]) -> RasterImage {
        RasterImage::decode(&render_pump_grid(statuses).expect("renders")).expect("valid png")
    }

    fn pixel(image: &RasterImage, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y * image.width() + x) * 3) as usize;
        [image.rgb()[offset], image.rgb()[offset + 1], image.rgb()[offset + 2]]
    }

    /// Dark pixels inside the label corner of a tile, row by row.
    fn label_pixels(image: &RasterImage, layout: GridLayout, index: u32) -> Vec<(u32, u32)> {
        let (x, y) = layout.tile_origin(index);
        let box_width = text_width("20", LABEL_SCALE);
        let left = x + TILE_WIDTH - LABEL_INSET - box_width;
        let top = y + LABEL_INSET;
        (top..top + GLYPH_HEIGHT * LABEL_SCALE)
            .flat_map(|py| (left..left + box_width).map(move |px| (px, py)))
            .filter(|(px, py)| pixel(image, *px, *py) == MARK.0)
            .map(|(px, py)| (px - left, py - top))
            .collect()
    }

    #[test]
    fn lays_out_five_tiles_per_row_below_the_heading() {
        let image = render(&[PumpStatus::Compliant; 7]);

        assert_eq!(image.width(), 2 * PADDING + 5 * TILE_WIDTH + 4 * GAP);
        assert_eq!(
            image.height(),
            2 * PADDING + HEADING_BLOCK + 2 * TILE_HEIGHT + GAP
        );
    }

    #[test]
    fn single_pump_grid_is_wide_enough_for_the_heading() {
        let layout = GridLayout::for_count(1);
        let image = render(&[PumpStatus::Compliant]);

        assert_eq!(image.width(), layout.width);
        assert!(layout.width >= text_width(GRID_HEADING, HEADING_SCALE) + 2 * PADDING);
        let (x, _) = layout.tile_origin(0);
        assert_eq!(x, (layout.width - TILE_WIDTH) / 2);
    }

    #[test]
    fn tiles_are_colored_by_status() {
        let statuses = [PumpStatus::Compliant, PumpStatus::NonCompliant];
        let layout = GridLayout::for_count(2);
        let image = render(&statuses);

        let (first_x, first_y) = layout.tile_origin(0);
        let (second_x, second_y) = layout.tile_origin(1);
        assert_eq!(pixel(&image, first_x + 2, first_y + 2), COMPLIANT.0);
        assert_eq!(pixel(&image, second_x + 2, second_y + 2), NON_COMPLIANT.0);
        assert_eq!(pixel(&image, 1, 1), BACKGROUND.0);
    }

    #[test]
    fn heading_is_drawn_above_the_tiles() {
        let layout = GridLayout::for_count(10);
        let image = render(&[PumpStatus::Compliant; 10]);

        let heading_pixels = (PADDING..PADDING + GLYPH_HEIGHT * HEADING_SCALE)
            .flat_map(|y| (0..layout.width).map(move |x| (x, y)))
            .filter(|(x, y)| pixel(&image, *x, *y) == HEADING.0)
            .count();
        assert!(heading_pixels > 0);
    }

    #[test]
    fn each_tile_carries_its_pump_number() {
        let layout = GridLayout::for_count(12);
        let image = render(&[PumpStatus::Compliant; 12]);

        let fourth = label_pixels(&image, layout, 3);
        assert!(!fourth.is_empty());
        assert_ne!(fourth, label_pixels(&image, layout, 0));

        // Same digit bitmap whatever the status underneath.
        let flagged = render(&[
            PumpStatus::Compliant,
            PumpStatus::Compliant,
            PumpStatus::Compliant,
            PumpStatus::NonCompliant,
        ]);
        assert_eq!(label_pixels(&flagged, GridLayout::for_count(4), 3), fourth);

        let twelfth = label_pixels(&image, layout, 11);
        assert!(twelfth.len() > fourth.len());
    }

    #[test]
    fn empty_grid_is_an_error() {
        assert!(matches!(render_pump_grid(&[]), Err(SnapshotError::Empty)));
    }
}

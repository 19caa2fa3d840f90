//! Preview annotation: face rectangles and identity labels.

use facematch_core::FaceBox;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Advance per character, one blank column between glyphs.
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;
const LABEL_PADDING: u32 = 5;

/// Draw a hollow rectangle around a face and, for matched faces, a
/// filled label bar with the identity text along the bottom edge.
///
/// Unlabeled ("Unknown") faces get only the rectangle; the label bar
/// is an explicit branch so no stale text from an earlier face can
/// leak in.
pub fn annotate_face(image: &mut RgbImage, face: &FaceBox, label: Option<&str>) {
    let width = face.width();
    let height = face.height();
    if width == 0 || height == 0 {
        return;
    }

    draw_hollow_rect_mut(
        image,
        Rect::at(face.left as i32, face.top as i32).of_size(width, height),
        BOX_COLOR,
    );

    let Some(text) = label else {
        return;
    };

    let bar_height = GLYPH_HEIGHT + 2 * LABEL_PADDING;
    let bar_top = face.bottom.saturating_sub(bar_height);
    draw_filled_rect_mut(
        image,
        Rect::at(face.left as i32, bar_top as i32).of_size(width, bar_height),
        BOX_COLOR,
    );

    draw_text(
        image,
        face.left + LABEL_PADDING,
        bar_top + LABEL_PADDING,
        text,
        TEXT_COLOR,
    );
}

/// Render text with the built-in 5x7 bitmap font. Pixels outside the
/// image are dropped; characters without a glyph render blank.
fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    let (img_w, img_h) = image.dimensions();
    for (i, ch) in text.chars().enumerate() {
        let columns = glyph(ch);
        let base_x = x + i as u32 * GLYPH_ADVANCE;
        for (cx, column) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if column & (1 << row) == 0 {
                    continue;
                }
                let px = base_x + cx as u32;
                let py = y + row;
                if px < img_w && py < img_h {
                    image.put_pixel(px, py, color);
                }
            }
        }
    }
}

/// 5x7 glyphs as column bitmasks, least significant bit at the top.
/// Lowercase letters reuse the uppercase shapes.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        '0' => [0x3E, 0x51, 0x49, 0x45, 0x3E],
        '1' => [0x00, 0x42, 0x7F, 0x40, 0x00],
        '2' => [0x42, 0x61, 0x51, 0x49, 0x46],
        '3' => [0x21, 0x41, 0x45, 0x4B, 0x31],
        '4' => [0x18, 0x14, 0x12, 0x7F, 0x10],
        '5' => [0x27, 0x45, 0x45, 0x45, 0x39],
        '6' => [0x3C, 0x4A, 0x49, 0x49, 0x30],
        '7' => [0x01, 0x71, 0x09, 0x05, 0x03],
        '8' => [0x36, 0x49, 0x49, 0x49, 0x36],
        '9' => [0x06, 0x49, 0x49, 0x29, 0x1E],
        'A' => [0x7E, 0x11, 0x11, 0x11, 0x7E],
        'B' => [0x7F, 0x49, 0x49, 0x49, 0x36],
        'C' => [0x3E, 0x41, 0x41, 0x41, 0x22],
        'D' => [0x7F, 0x41, 0x41, 0x22, 0x1C],
        'E' => [0x7F, 0x49, 0x49, 0x49, 0x41],
        'F' => [0x7F, 0x09, 0x09, 0x09, 0x01],
        'G' => [0x3E, 0x41, 0x49, 0x49, 0x7A],
        'H' => [0x7F, 0x08, 0x08, 0x08, 0x7F],
        'I' => [0x00, 0x41, 0x7F, 0x41, 0x00],
        'J' => [0x20, 0x40, 0x41, 0x3F, 0x01],
        'K' => [0x7F, 0x08, 0x14, 0x22, 0x41],
        'L' => [0x7F, 0x40, 0x40, 0x40, 0x40],
        'M' => [0x7F, 0x02, 0x0C, 0x02, 0x7F],
        'N' => [0x7F, 0x04, 0x08, 0x10, 0x7F],
        'O' => [0x3E, 0x41, 0x41, 0x41, 0x3E],
        'P' => [0x7F, 0x09, 0x09, 0x09, 0x06],
        'Q' => [0x3E, 0x41, 0x51, 0x21, 0x5E],
        'R' => [0x7F, 0x09, 0x19, 0x29, 0x46],
        'S' => [0x46, 0x49, 0x49, 0x49, 0x31],
        'T' => [0x01, 0x01, 0x7F, 0x01, 0x01],
        'U' => [0x3F, 0x40, 0x40, 0x40, 0x3F],
        'V' => [0x1F, 0x20, 0x40, 0x20, 0x1F],
        'W' => [0x3F, 0x40, 0x38, 0x40, 0x3F],
        'X' => [0x63, 0x14, 0x08, 0x14, 0x63],
        'Y' => [0x07, 0x08, 0x70, 0x08, 0x07],
        'Z' => [0x61, 0x51, 0x49, 0x45, 0x43],
        '.' => [0x00, 0x60, 0x60, 0x00, 0x00],
        ':' => [0x00, 0x36, 0x36, 0x00, 0x00],
        '-' => [0x08, 0x08, 0x08, 0x08, 0x08],
        '_' => [0x40, 0x40, 0x40, 0x40, 0x40],
        '%' => [0x23, 0x13, 0x08, 0x64, 0x62],
        _ => [0x00; 5],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(top: u32, right: u32, bottom: u32, left: u32) -> FaceBox {
        FaceBox { top, right, bottom, left, confidence: 0.9 }
    }

    fn blank(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([0, 0, 0]))
    }

    #[test]
    fn test_rectangle_drawn_on_border() {
        let mut img = blank(200, 200);
        annotate_face(&mut img, &face(50, 150, 150, 50), None);
        assert_eq!(*img.get_pixel(50, 50), BOX_COLOR);
        assert_eq!(*img.get_pixel(100, 50), BOX_COLOR);
        // Interior stays untouched without a label.
        assert_eq!(*img.get_pixel(100, 100), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_label_bar_filled_for_match() {
        let mut img = blank(200, 200);
        annotate_face(&mut img, &face(50, 150, 150, 50), Some("X"));
        // A pixel inside the bar region, away from any glyph column.
        assert_eq!(*img.get_pixel(140, 145), BOX_COLOR);
    }

    #[test]
    fn test_no_label_bar_for_unknown() {
        let mut img = blank(200, 200);
        annotate_face(&mut img, &face(50, 150, 150, 50), None);
        assert_eq!(*img.get_pixel(140, 145), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_degenerate_box_is_ignored() {
        let mut img = blank(100, 100);
        annotate_face(&mut img, &face(10, 10, 10, 10), Some("A"));
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_text_clipped_at_image_edge() {
        let mut img = blank(60, 60);
        // Bar extends to the right image edge; long text must not panic.
        annotate_face(&mut img, &face(0, 60, 60, 0), Some("A VERY LONG LABEL TEXT"));
    }

    #[test]
    fn test_glyph_lowercase_maps_to_uppercase() {
        assert_eq!(glyph('a'), glyph('A'));
    }

    #[test]
    fn test_unmapped_glyph_is_blank() {
        assert_eq!(glyph('§'), [0u8; 5]);
    }
}

use super::{Rect, Window};

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;

/// 3x5 glyphs, one row per byte, most significant of the low three bits on the left.
const GLYPHS: &[(char, [u8; 5])] = &[
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b110, 0b001, 0b010, 0b100, 0b111]),
    ('3', [0b110, 0b001, 0b010, 0b001, 0b110]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b110, 0b001, 0b110]),
    ('6', [0b011, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b110]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    ('\'', [0b010, 0b010, 0b000, 0b000, 0b000]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('?', [0b110, 0b001, 0b010, 0b000, 0b010]),
    ('#', [0b101, 0b111, 0b101, 0b111, 0b101]),
];

const UNKNOWN_GLYPH: [u8; 5] = [0b111, 0b101, 0b101, 0b101, 0b111];
const SPACE_GLYPH: [u8; 5] = [0; 5];

fn glyph_rows(ch: char) -> [u8; 5] {
    if ch == ' ' {
        return SPACE_GLYPH;
    }
    let upper = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(glyph_char, _)| *glyph_char == upper)
        .map(|(_, rows)| *rows)
        .unwrap_or(UNKNOWN_GLYPH)
}

pub fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale
}

/// Pixel size of `text` drawn at `scale` on a single line.
pub fn text_size(text: &str, scale: i32) -> (i32, i32) {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        return (0, 0);
    }
    (chars * glyph_advance(scale) - scale, GLYPH_HEIGHT * scale)
}

pub fn draw_text(window: &mut dyn Window, x: i32, y: i32, text: &str, scale: i32, color: [u8; 4]) {
    let scale = scale.max(1);
    let mut pen_x = x;
    for ch in text.chars() {
        let rows = glyph_rows(ch);
        for (row_index, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                window.fill_rect(
                    Rect::new(
                        pen_x + col * scale,
                        y + row_index as i32 * scale,
                        scale,
                        scale,
                    ),
                    color,
                );
            }
        }
        pen_x += glyph_advance(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rendering::SoftwareWindow;

    #[test]
    fn lowercase_maps_to_uppercase_glyphs() {
        assert_eq!(glyph_rows('r'), glyph_rows('R'));
    }

    #[test]
    fn unknown_character_uses_box_glyph() {
        assert_eq!(glyph_rows('@'), UNKNOWN_GLYPH);
        assert_eq!(glyph_rows(' '), SPACE_GLYPH);
    }

    #[test]
    fn text_size_follows_scale() {
        assert_eq!(text_size("", 2), (0, 0));
        assert_eq!(text_size("AB", 1), (7, 5));
        assert_eq!(text_size("AB", 2), (14, 10));
    }

    #[test]
    fn draw_text_writes_glyph_pixels_and_is_clipped() {
        let mut window = SoftwareWindow::new(8, 8);
        let white = [255, 255, 255, 255];
        draw_text(&mut window, 0, 0, "I", 1, white);
        assert_eq!(window.screen_pixel(0, 0), Some(white));
        assert_eq!(window.screen_pixel(1, 2), Some(white));
        assert_eq!(window.screen_pixel(0, 2), Some([0, 0, 0, 255]));

        draw_text(&mut window, -5, 6, "ROUTE 1", 2, white);
    }
}

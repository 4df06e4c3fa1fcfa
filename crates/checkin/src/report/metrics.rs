//! Text measurement for the standard Helvetica faces.
//!
//! Widths are the Adobe core-font metrics in thousandths of the font size.
//! Text is written with `WinAnsiEncoding`, so anything outside Latin-1 is
//! replaced with `?` both when measuring and when encoding.

use super::PT_PER_MM;

/// The fonts used by the attendance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

impl Font {
    /// PostScript name of the base font.
    #[must_use]
    pub fn base_name(self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }

    /// Resource name the page content refers to the font by.
    #[must_use]
    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width of one character in thousandths of the font size.
#[must_use]
pub fn char_width(font: Font, c: char) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    let c = latin_base(c);
    match c {
        ' '..='~' => table[c as usize - 0x20],
        _ => 556,
    }
}

/// Map accented Latin-1 letters onto the unaccented glyph they share a width with.
fn latin_base(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '\u{a0}' => ' ',
        c if u32::from(c) > 0xff => '?',
        c => c,
    }
}

/// Width of `text` in millimetres at `size` points.
#[must_use]
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(font, c))).sum();
    units as f32 / 1000.0 * size / PT_PER_MM
}

/// Encode `text` as `WinAnsiEncoding` bytes.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            0x20..=0x7e | 0xa0..=0xff => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Break `text` into lines no wider than `max_width` millimetres.
///
/// Lines break at whitespace; a word that alone exceeds the width is split
/// between characters. Explicit newlines are kept. Empty text is one empty
/// line.
#[must_use]
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, font, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, font, size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    let mut next = current.clone();
                    next.push(c);
                    if !current.is_empty() && text_width(&next, font, size) > max_width {
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    } else {
                        current = next;
                    }
                }
            }
        }
        lines.push(current);
    }

    lines
}

/// Width of the widest line of `text`, without wrapping.
#[must_use]
pub fn natural_width(text: &str, font: Font, size: f32) -> f32 {
    text.split('\n')
        .map(|line| text_width(line, font, size))
        .fold(0.0, f32::max)
}

/// Width of the widest single word of `text`.
#[must_use]
pub fn longest_word_width(text: &str, font: Font, size: f32) -> f32 {
    text.split_whitespace()
        .map(|word| text_width(word, font, size))
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_widths() {
        assert_eq!(char_width(Font::Regular, ' '), 278);
        assert_eq!(char_width(Font::Regular, 'A'), 667);
        assert_eq!(char_width(Font::Regular, 'i'), 222);
        assert_eq!(char_width(Font::Bold, 'i'), 278);
        assert_eq!(char_width(Font::Regular, '~'), 584);
    }

    #[test]
    fn test_accented_width_matches_base() {
        assert_eq!(char_width(Font::Regular, 'ó'), char_width(Font::Regular, 'o'));
        assert_eq!(char_width(Font::Bold, 'Ñ'), char_width(Font::Bold, 'N'));
    }

    #[test]
    fn test_text_width_in_mm() {
        // 1000 units at 72pt is one inch
        let width = text_width("W", Font::Regular, 72.0);
        assert!((width - 0.944 * 25.4).abs() < 1e-3);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Número"), b"N\xfamero".to_vec());
        assert_eq!(encode_win_ansi("a→b"), b"a?b".to_vec());
    }

    #[test]
    fn test_wrap_fits_on_one_line() {
        let lines = wrap_text("Ana Pérez", Font::Regular, 10.0, 100.0);
        assert_eq!(lines, vec!["Ana Pérez"]);
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        let width = text_width("García López", Font::Regular, 10.0) + 0.1;
        let lines = wrap_text("María José García López", Font::Regular, 10.0, width);
        assert_eq!(lines, vec!["María José", "García López"]);
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let width = text_width("ABCD", Font::Regular, 10.0) + 0.01;
        let lines = wrap_text("ABCDEFGHIJ", Font::Regular, 10.0, width);
        assert_eq!(lines, vec!["ABCD", "EFGH", "IJ"]);
    }

    #[test]
    fn test_wrap_empty_text_is_one_line() {
        assert_eq!(wrap_text("", Font::Regular, 10.0, 10.0), vec![String::new()]);
    }

    #[test]
    fn test_natural_and_word_widths() {
        let natural = natural_width("ab cd", Font::Regular, 10.0);
        let word = longest_word_width("ab cd", Font::Regular, 10.0);
        assert!(natural > word);
        assert!((word - text_width("ab", Font::Regular, 10.0)).abs() < 1e-6);
    }
}

//! Standard-14 font selection and WinAnsi text encoding

use lopdf::{dictionary, Dictionary};

use crate::error::CompileError;

/// The Latin standard-14 faces every PDF viewer ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Helvetica,
    Times,
    Courier,
}

impl StandardFont {
    /// Map a CSS/editor font family plus weight/style flags to a face.
    pub fn for_family(name: &str, bold: bool, italic: bool) -> Self {
        let lower = name.to_lowercase();
        // Names such as "Times-BoldItalic" carry the style themselves
        let bold = bold || lower.contains("bold");
        let italic = italic || lower.contains("italic") || lower.contains("oblique");

        match (family_of(&lower), bold, italic) {
            (Family::Helvetica, false, false) => StandardFont::Helvetica,
            (Family::Helvetica, true, false) => StandardFont::HelveticaBold,
            (Family::Helvetica, false, true) => StandardFont::HelveticaOblique,
            (Family::Helvetica, true, true) => StandardFont::HelveticaBoldOblique,
            (Family::Times, false, false) => StandardFont::TimesRoman,
            (Family::Times, true, false) => StandardFont::TimesBold,
            (Family::Times, false, true) => StandardFont::TimesItalic,
            (Family::Times, true, true) => StandardFont::TimesBoldItalic,
            (Family::Courier, false, false) => StandardFont::Courier,
            (Family::Courier, true, false) => StandardFont::CourierBold,
            (Family::Courier, false, true) => StandardFont::CourierOblique,
            (Family::Courier, true, true) => StandardFont::CourierBoldOblique,
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Font dictionary for embedding by reference (no font program needed).
    pub fn to_dictionary(&self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}

fn family_of(lower: &str) -> Family {
    // CSS generic families first
    match lower {
        "serif" => return Family::Times,
        "monospace" => return Family::Courier,
        "sans-serif" | "cursive" | "fantasy" => return Family::Helvetica,
        _ => {}
    }

    if lower.contains("times") || lower.contains("georgia") || lower.contains("garamond") {
        return Family::Times;
    }

    if lower.contains("courier")
        || lower.contains("mono")
        || lower.contains("consolas")
        || lower.contains("monaco")
    {
        return Family::Courier;
    }

    Family::Helvetica
}

/// Encode text for a simple font using WinAnsiEncoding (CP1252).
pub fn encode_win_ansi(text: &str) -> Result<Vec<u8>, CompileError> {
    text.chars()
        .map(|ch| {
            win_ansi_byte(ch).ok_or(CompileError::Encoding {
                ch,
                code: ch as u32,
            })
        })
        .collect()
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => {
            let byte = match ch {
                '\u{20AC}' => 0x80,
                '\u{201A}' => 0x82,
                '\u{0192}' => 0x83,
                '\u{201E}' => 0x84,
                '\u{2026}' => 0x85,
                '\u{2020}' => 0x86,
                '\u{2021}' => 0x87,
                '\u{02C6}' => 0x88,
                '\u{2030}' => 0x89,
                '\u{0160}' => 0x8A,
                '\u{2039}' => 0x8B,
                '\u{0152}' => 0x8C,
                '\u{017D}' => 0x8E,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201C}' => 0x93,
                '\u{201D}' => 0x94,
                '\u{2022}' => 0x95,
                '\u{2013}' => 0x96,
                '\u{2014}' => 0x97,
                '\u{02DC}' => 0x98,
                '\u{2122}' => 0x99,
                '\u{0161}' => 0x9A,
                '\u{203A}' => 0x9B,
                '\u{0153}' => 0x9C,
                '\u{017E}' => 0x9E,
                '\u{0178}' => 0x9F,
                _ => return None,
            };
            Some(byte)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_generic_families() {
        assert_eq!(StandardFont::for_family("serif", false, false), StandardFont::TimesRoman);
        assert_eq!(StandardFont::for_family("sans-serif", false, false), StandardFont::Helvetica);
        assert_eq!(StandardFont::for_family("monospace", false, false), StandardFont::Courier);
        assert_eq!(StandardFont::for_family("cursive", false, false), StandardFont::Helvetica);
    }

    #[test]
    fn test_named_families() {
        assert_eq!(StandardFont::for_family("Helvetica", false, false), StandardFont::Helvetica);
        assert_eq!(StandardFont::for_family("Arial", false, false), StandardFont::Helvetica);
        assert_eq!(StandardFont::for_family("Georgia", false, false), StandardFont::TimesRoman);
        assert_eq!(StandardFont::for_family("Consolas", false, false), StandardFont::Courier);
        assert_eq!(StandardFont::for_family("UnknownFont", false, false), StandardFont::Helvetica);
        assert_eq!(StandardFont::for_family("", false, false), StandardFont::Helvetica);
    }

    #[test]
    fn test_style_flags_and_styled_names() {
        assert_eq!(StandardFont::for_family("Helvetica", true, false), StandardFont::HelveticaBold);
        assert_eq!(StandardFont::for_family("serif", true, true), StandardFont::TimesBoldItalic);
        assert_eq!(StandardFont::for_family("Courier", false, true), StandardFont::CourierOblique);
        assert_eq!(StandardFont::for_family("Times-BoldItalic", false, false), StandardFont::TimesBoldItalic);
        assert_eq!(StandardFont::for_family("Arial-BoldMT", false, false), StandardFont::HelveticaBold);
    }

    #[test]
    fn test_base_font_names() {
        assert_eq!(StandardFont::HelveticaBold.base_font(), "Helvetica-Bold");
        assert_eq!(StandardFont::TimesRoman.base_font(), "Times-Roman");
        assert_eq!(StandardFont::CourierBoldOblique.base_font(), "Courier-BoldOblique");
    }

    #[test]
    fn test_encode_ascii_and_latin1() {
        assert_eq!(encode_win_ansi("Hi!").unwrap(), b"Hi!".to_vec());
        assert_eq!(encode_win_ansi("café").unwrap(), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_encode_cp1252_specials() {
        assert_eq!(encode_win_ansi("€").unwrap(), vec![0x80]);
        assert_eq!(encode_win_ansi("“ok”").unwrap(), vec![0x93, b'o', b'k', 0x94]);
        assert_eq!(encode_win_ansi("—").unwrap(), vec![0x97]);
    }

    #[test]
    fn test_encode_rejects_unmappable() {
        let err = encode_win_ansi("漢").unwrap_err();
        assert!(matches!(err, CompileError::Encoding { ch: '漢', .. }));
        assert!(encode_win_ansi("\u{1F600}").is_err());
    }
}

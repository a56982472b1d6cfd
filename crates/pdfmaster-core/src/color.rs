/// An RGB color with channels in the 0-1 range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`. Anything else parses as black.
    pub fn from_hex(color: &str) -> Self {
        let Some(hex) = color.strip_prefix('#') else {
            return Self::BLACK;
        };
        if hex.len() != 6 || !hex.is_ascii() {
            return Self::BLACK;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match (channel(0..2), channel(2..4), channel(4..6)) {
            (Some(r), Some(g), Some(b)) => {
                Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
            }
            _ => Self::BLACK,
        }
    }
}

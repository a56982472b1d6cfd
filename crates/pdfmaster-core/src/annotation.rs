//! Annotation records produced by the editor
//!
//! Every annotation is anchored to one page by a percentage position
//! relative to the rendered page image. The list keeps insertion order,
//! which is also paint order at export.

use serde::{Deserialize, Serialize};

use crate::fonts::StandardFont;

/// Fields shared by every annotation variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationBase {
    #[serde(default)]
    pub id: String,
    /// 0-based page index as the editor sent it. Negative or fractional
    /// values never match a page.
    #[serde(with = "page_number")]
    pub page_index: f64,
    /// Horizontal position, percent of the page width (not clamped)
    pub x: f64,
    /// Vertical position from the top, percent of the page height (not clamped)
    pub y: f64,
}

impl AnnotationBase {
    /// The page this annotation lands on, if the index is a whole number
    pub fn page(&self) -> Option<usize> {
        let index = self.page_index;
        (index >= 0.0 && index.fract() == 0.0 && index <= u32::MAX as f64)
            .then_some(index as usize)
    }

    pub fn new(page_index: u32, x: f64, y: f64) -> Self {
        Self {
            id: String::new(),
            page_index: page_index as f64,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrawingPoint {
    pub x: f64,
    pub y: f64,
}

impl DrawingPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(flatten)]
    pub base: AnnotationBase,
    pub content: String,
    pub font_size: f64,
    pub color: String,
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
}

impl TextAnnotation {
    pub fn is_bold(&self) -> bool {
        self.font_weight.as_deref().is_some_and(|weight| {
            let weight = weight.trim().to_lowercase();
            weight == "bold"
                || weight == "bolder"
                || weight.parse::<u32>().is_ok_and(|numeric| numeric >= 600)
        })
    }

    pub fn is_italic(&self) -> bool {
        self.font_style.as_deref().is_some_and(|style| {
            let style = style.trim().to_lowercase();
            style == "italic" || style == "oblique"
        })
    }

    /// The standard-14 face this text renders with.
    pub fn pdf_font(&self) -> StandardFont {
        StandardFont::for_family(&self.font_family, self.is_bold(), self.is_italic())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawingAnnotation {
    #[serde(flatten)]
    pub base: AnnotationBase,
    pub points: Vec<DrawingPoint>,
    pub color: String,
    pub thickness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl DrawingAnnotation {
    /// Stroke opacity. Zero and missing both mean opaque.
    pub fn opacity(&self) -> f64 {
        non_zero_or(self.opacity, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Arrow,
}

/// Shape size used when a shape carries no width or height.
pub const DEFAULT_SHAPE_SIZE: f64 = 10.0;

/// The editor treats an explicit zero the same as an absent value.
fn non_zero_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 => v,
        _ => default,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShapeAnnotation {
    #[serde(flatten)]
    pub base: AnnotationBase,
    pub shape_type: ShapeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    pub thickness: f64,
}

impl ShapeAnnotation {
    pub fn width(&self) -> f64 {
        non_zero_or(self.width, DEFAULT_SHAPE_SIZE)
    }

    pub fn height(&self) -> f64 {
        non_zero_or(self.height, DEFAULT_SHAPE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnnotation {
    #[serde(flatten)]
    pub base: AnnotationBase,
    /// `data:image/png;base64,...` or `data:image/jpeg;base64,...`
    pub data_url: String,
    pub width: f64,
    pub height: f64,
    /// Degrees, counter-clockwise
    #[serde(default)]
    pub rotation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Annotation {
    Text(TextAnnotation),
    Drawing(DrawingAnnotation),
    Shape(ShapeAnnotation),
    Image(ImageAnnotation),
}

impl Annotation {
    pub fn base(&self) -> &AnnotationBase {
        match self {
            Annotation::Text(a) => &a.base,
            Annotation::Drawing(a) => &a.base,
            Annotation::Shape(a) => &a.base,
            Annotation::Image(a) => &a.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut AnnotationBase {
        match self {
            Annotation::Text(a) => &mut a.base,
            Annotation::Drawing(a) => &mut a.base,
            Annotation::Shape(a) => &mut a.base,
            Annotation::Image(a) => &mut a.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn page(&self) -> Option<usize> {
        self.base().page()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Annotation::Text(_) => "text",
            Annotation::Drawing(_) => "drawing",
            Annotation::Shape(_) => "shape",
            Annotation::Image(_) => "image",
        }
    }

    /// Move the anchor. Drawings shift every point by the same delta so the
    /// stroke keeps its shape.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let (dx, dy) = {
            let base = self.base();
            (x - base.x, y - base.y)
        };
        if let Annotation::Drawing(drawing) = self {
            for point in &mut drawing.points {
                point.x += dx;
                point.y += dy;
            }
        }
        let base = self.base_mut();
        base.x = x;
        base.y = y;
    }
}

/// Page indices arrive as plain JSON numbers. Whole values are written back
/// as integers.
mod page_number {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer)
    }
}

/// Fresh random identifier for a new annotation
pub fn new_annotation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnnotationList {
    annotations: Vec<Annotation>,
}

impl AnnotationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an annotation, assigning an id if it has none. Returns the id.
    pub fn add(&mut self, mut annotation: Annotation) -> String {
        if annotation.id().is_empty() {
            annotation.base_mut().id = new_annotation_id();
        }
        let id = annotation.id().to_string();
        self.annotations.push(annotation);
        id
    }

    pub fn remove(&mut self, id: &str) -> bool {
        if let Some(pos) = self.annotations.iter().position(|a| a.id() == id) {
            self.annotations.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id() == id)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotations_for_page(&self, page_index: u32) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.page() == Some(page_index as usize))
            .collect()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.annotations)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let annotations: Vec<Annotation> = serde_json::from_str(json)?;
        Ok(Self { annotations })
    }
}

impl From<Vec<Annotation>> for AnnotationList {
    fn from(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }
}

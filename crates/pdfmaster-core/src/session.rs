//! Editor session: one open document, its annotations and the active tool
//!
//! Gesture coordinates are percentages of the rendered page, the same space
//! the annotations are stored in.

use tracing::debug;

use crate::annotation::{
    Annotation, AnnotationBase, AnnotationList, DrawingAnnotation, DrawingPoint, ImageAnnotation,
    ShapeAnnotation, ShapeKind, TextAnnotation,
};
use crate::compile::{compile_with_report, CompileOutput};
use crate::config::Config;
use crate::error::{CompileError, SessionError};
use crate::plan::{check_file, Plan, Tool, Usage};
use crate::validation::{validate_pdf, PdfInfo};

pub const DEFAULT_COLOR: &str = "#4f46e5";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";
pub const PLACEHOLDER_TEXT: &str = "Type here...";
pub const STROKE_THICKNESS: f64 = 2.0;

#[derive(Debug, Clone)]
struct OpenDocument {
    name: String,
    bytes: Vec<u8>,
    info: PdfInfo,
}

/// A gesture between pointer down and pointer up
#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Stroke {
        page_index: u32,
        points: Vec<DrawingPoint>,
    },
    Drag {
        page_index: u32,
        origin: DrawingPoint,
        corner: DrawingPoint,
    },
}

impl Gesture {
    fn page_index(&self) -> u32 {
        match self {
            Gesture::Stroke { page_index, .. } | Gesture::Drag { page_index, .. } => *page_index,
        }
    }
}

#[derive(Debug)]
pub struct EditorSession {
    plan: Plan,
    config: Config,
    usage: Usage,
    document: Option<OpenDocument>,
    annotations: AnnotationList,
    tool: Tool,
    selected: Option<String>,
    gesture: Option<Gesture>,
    color: String,
    font_size: f64,
    shape_kind: ShapeKind,
}

impl EditorSession {
    pub fn new(plan: Plan, config: Config) -> Self {
        Self {
            plan,
            config,
            usage: Usage::today(),
            document: None,
            annotations: AnnotationList::new(),
            tool: Tool::Select,
            selected: None,
            gesture: None,
            color: DEFAULT_COLOR.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            shape_kind: ShapeKind::Rectangle,
        }
    }

    /// Resume with usage persisted by the host
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.set_usage(usage);
        self
    }

    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    /// Change plan. A tool the new plan forbids falls back to `select`.
    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = plan;
        if !plan.allows(self.tool) {
            self.tool = Tool::Select;
            self.gesture = None;
        }
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open a document, replacing any previous one and its annotations.
    pub fn load(&mut self, name: &str, bytes: Vec<u8>) -> Result<&PdfInfo, SessionError> {
        check_file(self.plan, &self.usage, bytes.len() as u64, &self.config.quota)?;
        let info = validate_pdf(&bytes)?;
        if info.encrypted {
            return Err(SessionError::Compile(CompileError::Encrypted));
        }
        debug!(document = name, pages = info.page_count, bytes = bytes.len(), "Document opened");

        self.annotations.clear();
        self.selected = None;
        self.gesture = None;
        let document = self.document.insert(OpenDocument {
            name: name.to_string(),
            bytes,
            info,
        });
        Ok(&document.info)
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document.as_ref().map(|doc| doc.name.as_str())
    }

    pub fn document_bytes(&self) -> Option<&[u8]> {
        self.document.as_ref().map(|doc| doc.bytes.as_slice())
    }

    pub fn info(&self) -> Option<&PdfInfo> {
        self.document.as_ref().map(|doc| &doc.info)
    }

    pub fn page_count(&self) -> u32 {
        self.info().map_or(0, |info| info.page_count)
    }

    /// Everything before the first dot, so `q3.report.pdf` downloads as
    /// `q3_mastered.pdf`
    pub fn download_name(&self) -> Option<String> {
        let name = self.document_name()?;
        let stem = name.split('.').next().unwrap_or_default();
        Some(format!("{}_mastered.pdf", stem))
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn select_tool(&mut self, tool: Tool) -> Result<(), SessionError> {
        if !self.plan.allows(tool) {
            return Err(SessionError::UpgradeRequired(tool));
        }
        self.tool = tool;
        self.selected = None;
        self.gesture = None;
        Ok(())
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: &str) {
        self.color = color.to_string();
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape_kind
    }

    pub fn set_shape_kind(&mut self, kind: ShapeKind) {
        self.shape_kind = kind;
    }

    pub fn annotations(&self) -> &AnnotationList {
        &self.annotations
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: Option<&str>) -> Result<(), SessionError> {
        match id {
            Some(id) if self.annotations.get(id).is_none() => {
                Err(SessionError::NotFound(id.to_string()))
            }
            _ => {
                self.selected = id.map(str::to_string);
                Ok(())
            }
        }
    }

    /// Start a gesture. The text tool places its annotation immediately and
    /// returns its id.
    pub fn pointer_down(&mut self, page_index: u32, x: f64, y: f64) -> Option<String> {
        self.document.as_ref()?;
        let point = DrawingPoint::new(x, y);
        match self.tool {
            Tool::Text => {
                let id = self.annotations.add(Annotation::Text(TextAnnotation {
                    base: AnnotationBase::new(page_index, x, y),
                    content: PLACEHOLDER_TEXT.to_string(),
                    font_size: self.font_size,
                    color: self.color.clone(),
                    font_family: DEFAULT_FONT_FAMILY.to_string(),
                    font_weight: None,
                    font_style: None,
                }));
                self.selected = Some(id.clone());
                self.tool = Tool::Select;
                Some(id)
            }
            Tool::Draw => {
                self.gesture = Some(Gesture::Stroke {
                    page_index,
                    points: vec![point],
                });
                None
            }
            Tool::Shape => {
                self.gesture = Some(Gesture::Drag {
                    page_index,
                    origin: point,
                    corner: point,
                });
                None
            }
            Tool::Select => {
                self.selected = None;
                None
            }
            Tool::Image | Tool::Signature | Tool::Erase => None,
        }
    }

    /// Extend the current gesture. Moves over another page are ignored.
    pub fn pointer_move(&mut self, page_index: u32, x: f64, y: f64) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        if gesture.page_index() != page_index {
            return;
        }
        match gesture {
            Gesture::Stroke { points, .. } => points.push(DrawingPoint::new(x, y)),
            Gesture::Drag { corner, .. } => *corner = DrawingPoint::new(x, y),
        }
    }

    /// Finish the current gesture, committing its annotation if it produced
    /// one. Releasing over another page abandons the gesture.
    pub fn pointer_up(&mut self, page_index: u32) -> Option<String> {
        let gesture = self.gesture.take()?;
        if gesture.page_index() != page_index {
            return None;
        }
        let annotation = match gesture {
            Gesture::Stroke { page_index, points } => {
                if points.len() < 2 {
                    return None;
                }
                let first = points[0];
                Annotation::Drawing(DrawingAnnotation {
                    base: AnnotationBase::new(page_index, first.x, first.y),
                    points,
                    color: self.color.clone(),
                    thickness: STROKE_THICKNESS,
                    opacity: None,
                })
            }
            Gesture::Drag {
                page_index,
                origin,
                corner,
            } => {
                let width = (corner.x - origin.x).abs();
                let height = (corner.y - origin.y).abs();
                Annotation::Shape(ShapeAnnotation {
                    base: AnnotationBase::new(
                        page_index,
                        origin.x.min(corner.x),
                        origin.y.min(corner.y),
                    ),
                    shape_type: self.shape_kind,
                    width: (width > 0.0).then_some(width),
                    height: (height > 0.0).then_some(height),
                    color: self.color.clone(),
                    fill: None,
                    thickness: STROKE_THICKNESS,
                })
            }
        };
        Some(self.annotations.add(annotation))
    }

    /// Place an uploaded image; width and height are percentages of the page.
    pub fn add_image(
        &mut self,
        page_index: u32,
        x: f64,
        y: f64,
        data_url: &str,
        width: f64,
        height: f64,
    ) -> Result<String, SessionError> {
        if !self.plan.allows(Tool::Image) {
            return Err(SessionError::UpgradeRequired(Tool::Image));
        }
        if self.document.is_none() {
            return Err(SessionError::NoDocument);
        }
        let id = self.annotations.add(Annotation::Image(ImageAnnotation {
            base: AnnotationBase::new(page_index, x, y),
            data_url: data_url.to_string(),
            width,
            height,
            rotation: 0.0,
        }));
        self.selected = Some(id.clone());
        Ok(id)
    }

    /// Add a fully-formed annotation, as restored from a saved draft
    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<String, SessionError> {
        if self.document.is_none() {
            return Err(SessionError::NoDocument);
        }
        Ok(self.annotations.add(annotation))
    }

    pub fn update_text(&mut self, id: &str, content: &str) -> Result<(), SessionError> {
        match self.annotations.get_mut(id) {
            Some(Annotation::Text(text)) => {
                text.content = content.to_string();
                Ok(())
            }
            _ => Err(SessionError::NotFound(id.to_string())),
        }
    }

    pub fn move_annotation(&mut self, id: &str, x: f64, y: f64) -> Result<(), SessionError> {
        let annotation = self
            .annotations
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        annotation.move_to(x, y);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<(), SessionError> {
        if !self.annotations.remove(id) {
            return Err(SessionError::NotFound(id.to_string()));
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.selected = None;
        self.gesture = None;
    }

    /// Compile the open document and count the export against today's usage.
    pub fn export_with_report(
        &mut self,
        page_order: Option<&[usize]>,
    ) -> Result<CompileOutput, SessionError> {
        let document = self.document.as_ref().ok_or(SessionError::NoDocument)?;
        let output = compile_with_report(
            &document.bytes,
            self.annotations.annotations(),
            self.plan,
            page_order,
            &self.config.compile,
        )?;
        self.usage.increment();
        debug!(exports_today = self.usage.count, "Export counted");
        Ok(output)
    }

    pub fn export(&mut self, page_order: Option<&[usize]>) -> Result<Vec<u8>, SessionError> {
        self.export_with_report(page_order).map(|output| output.bytes)
    }
}

//! Draw annotations into page content streams
//!
//! Each touched page gets one overlay stream holding every mark for that
//! page, in annotation order. Fonts and transparency states are document
//! objects shared by every page of one export; each page only gets a
//! resource name pointing at them.

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::annotation::{
    Annotation, DrawingAnnotation, ImageAnnotation, ShapeAnnotation, ShapeKind, TextAnnotation,
};
use crate::color::Rgb;
use crate::coords::PageSize;
use crate::error::CompileError;
use crate::fonts::{encode_win_ansi, StandardFont};
use crate::page;
use crate::raster;

const FONT: &[u8] = b"Font";
const EXT_G_STATE: &[u8] = b"ExtGState";
const X_OBJECT: &[u8] = b"XObject";

/// Control-point distance for approximating a quarter ellipse with a cubic
/// Bezier curve.
const KAPPA: f64 = 0.552_284_749_8;

/// Line spacing for multi-line text, as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;

/// Why an annotation left no mark
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    PageOutOfRange { page_count: usize },
    TooFewPoints { points: usize },
    UnsupportedShape { shape: ShapeKind },
    ImageFailed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered,
    Skipped(SkipReason),
}

/// A single run of text in one face
#[derive(Debug, Clone)]
pub struct TextRun<'t> {
    pub text: &'t str,
    pub font: StandardFont,
    pub size: f64,
    pub color: Rgb,
    /// Baseline origin of the first line, PDF points
    pub x: f64,
    pub y: f64,
    pub opacity: Option<f64>,
}

/// Document-level objects reused across one export
#[derive(Debug, Default)]
struct SharedResources {
    fonts: BTreeMap<StandardFont, ObjectId>,
    opacity_states: BTreeMap<u32, ObjectId>,
}

impl SharedResources {
    fn font(&mut self, doc: &mut Document, face: StandardFont) -> ObjectId {
        *self
            .fonts
            .entry(face)
            .or_insert_with(|| doc.add_object(face.to_dictionary()))
    }

    fn opacity(&mut self, doc: &mut Document, alpha: f64) -> ObjectId {
        let alpha = alpha.clamp(0.0, 1.0) as f32;
        *self.opacity_states.entry(alpha.to_bits()).or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "CA" => Object::Real(alpha),
                "ca" => Object::Real(alpha),
            })
        })
    }
}

/// Pending overlay for one page
#[derive(Debug)]
struct PageCanvas {
    page_id: ObjectId,
    size: PageSize,
    resources: lopdf::Dictionary,
    taken: HashSet<(&'static [u8], Vec<u8>)>,
    assigned: HashMap<(&'static [u8], ObjectId), Vec<u8>>,
    pending: BTreeMap<&'static [u8], Vec<(Vec<u8>, ObjectId)>>,
    next_name: usize,
    operations: Vec<Operation>,
}

impl PageCanvas {
    fn new(doc: &Document, page_id: ObjectId) -> Self {
        let resources = page::effective_resources(doc, page_id);
        let mut taken = HashSet::new();
        for category in [FONT, EXT_G_STATE, X_OBJECT] {
            for name in page::resource_names(&resources, category) {
                taken.insert((category, name));
            }
        }
        Self {
            page_id,
            size: page::page_size(doc, page_id),
            resources,
            taken,
            assigned: HashMap::new(),
            pending: BTreeMap::new(),
            next_name: 0,
            operations: Vec::new(),
        }
    }

    /// Resource name for `id` on this page, allocating one that does not
    /// clash with names the page already uses.
    fn name_for(&mut self, category: &'static [u8], prefix: &str, id: ObjectId) -> Vec<u8> {
        if let Some(name) = self.assigned.get(&(category, id)) {
            return name.clone();
        }
        let name = loop {
            let candidate = format!("{}{}", prefix, self.next_name).into_bytes();
            self.next_name += 1;
            if !self.taken.contains(&(category, candidate.clone())) {
                break candidate;
            }
        };
        self.taken.insert((category, name.clone()));
        self.assigned.insert((category, id), name.clone());
        self.pending
            .entry(category)
            .or_default()
            .push((name.clone(), id));
        name
    }

    fn write(self, doc: &mut Document) -> Result<(), CompileError> {
        if self.operations.is_empty() {
            return Ok(());
        }
        let mut resources = self.resources;
        for (category, entries) in self.pending {
            page::insert_resources(&mut resources, category, entries);
        }
        page::set_resources(doc, self.page_id, resources)?;

        let content = Content {
            operations: self.operations,
        }
        .encode()
        .map_err(|e| CompileError::Page(format!("Failed to encode content: {}", e)))?;
        page::append_content(doc, self.page_id, content)
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn name(value: Vec<u8>) -> Object {
    Object::Name(value)
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn stroke_color(color: Rgb) -> Operation {
    op(
        "RG",
        vec![real(color.r as f64), real(color.g as f64), real(color.b as f64)],
    )
}

fn fill_color(color: Rgb) -> Operation {
    op(
        "rg",
        vec![real(color.r as f64), real(color.g as f64), real(color.b as f64)],
    )
}

fn paint_operator(fill: bool, stroke: bool) -> &'static str {
    match (fill, stroke) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    }
}

/// Four-curve ellipse path centered on (cx, cy)
fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Operation> {
    let (ox, oy) = (rx * KAPPA, ry * KAPPA);
    let curve = |points: [f64; 6]| op("c", points.iter().map(|v| real(*v)).collect());
    vec![
        op("m", vec![real(cx + rx), real(cy)]),
        curve([cx + rx, cy + oy, cx + ox, cy + ry, cx, cy + ry]),
        curve([cx - ox, cy + ry, cx - rx, cy + oy, cx - rx, cy]),
        curve([cx - rx, cy - oy, cx - ox, cy - ry, cx, cy - ry]),
        curve([cx + ox, cy - ry, cx + rx, cy - oy, cx + rx, cy]),
        op("h", vec![]),
    ]
}

/// Renders annotations onto a loaded document
pub struct Renderer<'a> {
    doc: &'a mut Document,
    pages: Vec<ObjectId>,
    shared: SharedResources,
    canvases: BTreeMap<usize, PageCanvas>,
}

impl<'a> Renderer<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc,
            pages,
            shared: SharedResources::default(),
            canvases: BTreeMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn canvas(&mut self, page_index: usize) -> Result<&mut PageCanvas, CompileError> {
        let page_id = *self
            .pages
            .get(page_index)
            .ok_or_else(|| CompileError::Page(format!("Page index {} not found", page_index)))?;
        let doc = &*self.doc;
        Ok(self
            .canvases
            .entry(page_index)
            .or_insert_with(|| PageCanvas::new(doc, page_id)))
    }

    pub fn page_size(&mut self, page_index: usize) -> Result<PageSize, CompileError> {
        Ok(self.canvas(page_index)?.size)
    }

    /// Draw one annotation. Marks that cannot render are reported, not errors.
    pub fn render(&mut self, annotation: &Annotation) -> Result<RenderOutcome, CompileError> {
        let Some(page_index) = annotation.page().filter(|&index| index < self.pages.len()) else {
            debug!(
                id = annotation.id(),
                page_index = annotation.base().page_index,
                page_count = self.pages.len(),
                "Annotation targets a missing page"
            );
            return Ok(RenderOutcome::Skipped(SkipReason::PageOutOfRange {
                page_count: self.pages.len(),
            }));
        };

        match annotation {
            Annotation::Text(text) => self.render_text(page_index, text),
            Annotation::Drawing(drawing) => self.render_drawing(page_index, drawing),
            Annotation::Shape(shape) => self.render_shape(page_index, shape),
            Annotation::Image(image) => self.render_image(page_index, image),
        }
    }

    fn render_text(
        &mut self,
        page_index: usize,
        text: &TextAnnotation,
    ) -> Result<RenderOutcome, CompileError> {
        let size = self.page_size(page_index)?;
        let anchor = size.to_pdf(text.base.x, text.base.y);
        self.draw_text(
            page_index,
            &TextRun {
                text: &text.content,
                font: text.pdf_font(),
                size: text.font_size,
                color: Rgb::from_hex(&text.color),
                x: anchor.x,
                y: anchor.y - text.font_size,
                opacity: None,
            },
        )?;
        Ok(RenderOutcome::Rendered)
    }

    /// Draw a text run. Fails without drawing anything if any character
    /// cannot be encoded.
    pub fn draw_text(&mut self, page_index: usize, run: &TextRun<'_>) -> Result<(), CompileError> {
        let lines = run
            .text
            .split('\n')
            .map(|line| encode_win_ansi(line.trim_end_matches('\r')))
            .collect::<Result<Vec<_>, _>>()?;

        let font_id = self.shared.font(self.doc, run.font);
        let state_id = run
            .opacity
            .map(|alpha| self.shared.opacity(self.doc, alpha));

        let canvas = self.canvas(page_index)?;
        let font_name = canvas.name_for(FONT, "PMF", font_id);

        canvas.operations.push(op("q", vec![]));
        if let Some(state_id) = state_id {
            let state_name = canvas.name_for(EXT_G_STATE, "PMGS", state_id);
            canvas.operations.push(op("gs", vec![name(state_name)]));
        }
        canvas.operations.push(op("BT", vec![]));
        canvas
            .operations
            .push(op("Tf", vec![name(font_name), real(run.size)]));
        canvas.operations.push(fill_color(run.color));
        canvas.operations.push(op(
            "Tm",
            vec![
                real(1.0),
                real(0.0),
                real(0.0),
                real(1.0),
                real(run.x),
                real(run.y),
            ],
        ));
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                canvas
                    .operations
                    .push(op("Td", vec![real(0.0), real(-run.size * LINE_HEIGHT)]));
            }
            canvas.operations.push(op(
                "Tj",
                vec![Object::String(line, lopdf::StringFormat::Literal)],
            ));
        }
        canvas.operations.push(op("ET", vec![]));
        canvas.operations.push(op("Q", vec![]));
        Ok(())
    }

    fn render_drawing(
        &mut self,
        page_index: usize,
        drawing: &DrawingAnnotation,
    ) -> Result<RenderOutcome, CompileError> {
        if drawing.points.len() < 2 {
            return Ok(RenderOutcome::Skipped(SkipReason::TooFewPoints {
                points: drawing.points.len(),
            }));
        }

        let color = Rgb::from_hex(&drawing.color);
        let state_id = self.shared.opacity(self.doc, drawing.opacity());
        let canvas = self.canvas(page_index)?;
        let size = canvas.size;
        let state_name = canvas.name_for(EXT_G_STATE, "PMGS", state_id);

        for pair in drawing.points.windows(2) {
            let start = size.to_pdf(pair[0].x, pair[0].y);
            let end = size.to_pdf(pair[1].x, pair[1].y);
            canvas.operations.extend([
                op("q", vec![]),
                op("gs", vec![name(state_name.clone())]),
                stroke_color(color),
                op("w", vec![real(drawing.thickness)]),
                op("m", vec![real(start.x), real(start.y)]),
                op("l", vec![real(end.x), real(end.y)]),
                op("S", vec![]),
                op("Q", vec![]),
            ]);
        }
        Ok(RenderOutcome::Rendered)
    }

    fn render_shape(
        &mut self,
        page_index: usize,
        shape: &ShapeAnnotation,
    ) -> Result<RenderOutcome, CompileError> {
        if shape.shape_type == ShapeKind::Arrow {
            // Arrows exist in the editor but have never been exported
            return Ok(RenderOutcome::Skipped(SkipReason::UnsupportedShape {
                shape: ShapeKind::Arrow,
            }));
        }

        let canvas = self.canvas(page_index)?;
        let size = canvas.size;
        let anchor = size.to_pdf(shape.base.x, shape.base.y);
        let (w, h) = size.scale(shape.width(), shape.height());
        let stroke = shape.thickness > 0.0;
        let fill = shape.fill.as_deref().map(Rgb::from_hex);

        canvas.operations.push(op("q", vec![]));
        canvas.operations.push(stroke_color(Rgb::from_hex(&shape.color)));
        canvas.operations.push(op("w", vec![real(shape.thickness)]));
        if let Some(fill) = fill {
            canvas.operations.push(fill_color(fill));
        }
        match shape.shape_type {
            ShapeKind::Rectangle => canvas.operations.push(op(
                "re",
                vec![real(anchor.x), real(anchor.y - h), real(w), real(h)],
            )),
            ShapeKind::Circle => canvas.operations.extend(ellipse_path(
                anchor.x + w / 2.0,
                anchor.y - h / 2.0,
                w / 2.0,
                h / 2.0,
            )),
            ShapeKind::Arrow => {}
        }
        canvas
            .operations
            .push(op(paint_operator(fill.is_some(), stroke), vec![]));
        canvas.operations.push(op("Q", vec![]));
        Ok(RenderOutcome::Rendered)
    }

    fn render_image(
        &mut self,
        page_index: usize,
        image: &ImageAnnotation,
    ) -> Result<RenderOutcome, CompileError> {
        let size = self.page_size(page_index)?;
        let xobject_id = match raster::embed_data_url(self.doc, &image.data_url) {
            Ok(id) => id,
            Err(e) => {
                warn!(id = %image.base.id, error = %e, "Embedding failed, image skipped");
                return Ok(RenderOutcome::Skipped(SkipReason::ImageFailed {
                    message: e.to_string(),
                }));
            }
        };

        let anchor = size.to_pdf(image.base.x, image.base.y);
        let (w, h) = size.scale(image.width, image.height);
        let (sin, cos) = image.rotation.to_radians().sin_cos();

        let canvas = self.canvas(page_index)?;
        let image_name = canvas.name_for(X_OBJECT, "PMIm", xobject_id);
        canvas.operations.extend([
            op("q", vec![]),
            op(
                "cm",
                vec![
                    real(1.0),
                    real(0.0),
                    real(0.0),
                    real(1.0),
                    real(anchor.x),
                    real(anchor.y - h),
                ],
            ),
            op(
                "cm",
                vec![real(cos), real(sin), real(-sin), real(cos), real(0.0), real(0.0)],
            ),
            op(
                "cm",
                vec![real(w), real(0.0), real(0.0), real(h), real(0.0), real(0.0)],
            ),
            op("Do", vec![name(image_name)]),
            op("Q", vec![]),
        ]);
        Ok(RenderOutcome::Rendered)
    }

    /// Write overlays and resources for every page that received marks.
    /// Returns the number of pages changed.
    pub fn finish(self) -> Result<usize, CompileError> {
        let mut changed = 0;
        for canvas in self.canvases.into_values() {
            if !canvas.operations.is_empty() {
                changed += 1;
            }
            canvas.write(self.doc)?;
        }
        Ok(changed)
    }
}

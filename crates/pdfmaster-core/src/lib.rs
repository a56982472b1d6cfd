//! PDF annotation compiler
//!
//! Takes the original PDF bytes and the annotations placed in the editor and
//! writes them into the page content: text in the standard-14 fonts,
//! freehand strokes, rectangles and ellipses, embedded PNG/JPEG images, and
//! the free-plan watermark.
//!
//! The pipeline is `compile` -> `Renderer` (one overlay stream per page) ->
//! `apply_watermark` -> save. `EditorSession` is the stateful editor model in
//! front of it: tool gating, gestures, quota and usage.

pub mod annotation;
pub mod color;
pub mod compile;
pub mod config;
pub mod coords;
pub mod error;
pub mod fonts;
pub mod page;
pub mod plan;
pub mod raster;
pub mod render;
pub mod session;
pub mod validation;
pub mod watermark;

pub use annotation::{
    Annotation, AnnotationBase, AnnotationList, DrawingAnnotation, DrawingPoint, ImageAnnotation,
    ShapeAnnotation, ShapeKind, TextAnnotation,
};
pub use color::Rgb;
pub use compile::{compile, compile_with_report, CompileOutput, CompileReport, SkippedAnnotation};
pub use config::{CompileConfig, Config, QuotaLimits, WatermarkConfig};
pub use coords::{PageSize, PdfPoint};
pub use error::{CompileError, ConfigError, ImageError, QuotaError, SessionError, ValidationError};
pub use plan::{check_file, Plan, Tool, Usage};
pub use render::{RenderOutcome, Renderer, SkipReason};
pub use session::EditorSession;
pub use validation::{quick_validate, validate_pdf, PdfInfo};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, CompileError> {
    let doc = compile::load_document(bytes)?;
    Ok(doc.get_pages().len() as u32)
}

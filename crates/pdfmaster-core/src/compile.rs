//! Export entrypoint: original bytes plus annotations in, final bytes out

use lopdf::Document;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::annotation::Annotation;
use crate::config::CompileConfig;
use crate::error::CompileError;
use crate::plan::Plan;
use crate::render::{RenderOutcome, Renderer, SkipReason};
use crate::watermark::apply_watermark;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAnnotation {
    pub id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// What one export did to the document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
    pub page_count: usize,
    pub rendered: usize,
    pub skipped: Vec<SkippedAnnotation>,
    pub watermarked_pages: usize,
    pub pages_changed: usize,
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub bytes: Vec<u8>,
    pub report: CompileReport,
}

/// Apply `annotations` to the PDF in `original` with default settings.
///
/// `page_order` is accepted for interface compatibility and ignored.
pub fn compile(
    original: &[u8],
    annotations: &[Annotation],
    plan: Plan,
    page_order: Option<&[usize]>,
) -> Result<Vec<u8>, CompileError> {
    compile_with_report(
        original,
        annotations,
        plan,
        page_order,
        &CompileConfig::default(),
    )
    .map(|output| output.bytes)
}

/// Load a document, refusing encrypted ones.
pub fn load_document(bytes: &[u8]) -> Result<Document, CompileError> {
    let doc = Document::load_mem(bytes).map_err(|e| CompileError::Load(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(CompileError::Encrypted);
    }
    Ok(doc)
}

#[instrument(skip_all, fields(annotations = annotations.len(), pro = plan.is_pro()))]
pub fn compile_with_report(
    original: &[u8],
    annotations: &[Annotation],
    plan: Plan,
    page_order: Option<&[usize]>,
    config: &CompileConfig,
) -> Result<CompileOutput, CompileError> {
    let mut doc = load_document(original)?;

    if let Some(order) = page_order {
        debug!(pages = order.len(), "Page order ignored");
    }

    let mut report = CompileReport::default();
    let mut renderer = Renderer::new(&mut doc);
    report.page_count = renderer.page_count();

    for annotation in annotations {
        match renderer.render(annotation)? {
            RenderOutcome::Rendered => report.rendered += 1,
            RenderOutcome::Skipped(reason) => report.skipped.push(SkippedAnnotation {
                id: annotation.id().to_string(),
                reason,
            }),
        }
    }

    report.watermarked_pages = apply_watermark(&mut renderer, plan, &config.watermark)?;
    report.pages_changed = renderer.finish()?;

    if config.compress {
        doc.compress();
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| CompileError::Save(e.to_string()))?;

    debug!(
        page_count = report.page_count,
        rendered = report.rendered,
        skipped = report.skipped.len(),
        watermarked = report.watermarked_pages,
        bytes = bytes.len(),
        "Export compiled"
    );

    Ok(CompileOutput { bytes, report })
}

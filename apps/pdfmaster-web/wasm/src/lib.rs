//! WASM bindings for the PDFMaster editor
//!
//! Annotation state lives in Rust inside an `EditorHandle`; JavaScript only
//! renders pages (PDF.js), forwards pointer events and downloads the result.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { EditorHandle, compilePdf } from './pkg/pdfmaster_wasm.js';
//!
//! await init();
//!
//! const editor = new EditorHandle(user.isPro, null);
//! editor.setProgressCallback((current, total, msg) => updateUI(current, total, msg));
//! const info = editor.loadDocument(file.name, bytes);
//! editor.selectTool("draw");
//! editor.pointerDown(0, 10, 10);
//! editor.pointerMove(0, 20, 25);
//! editor.pointerUp(0);
//! const result = editor.export(null);
//! downloadBlob(result, editor.downloadName());
//!
//! // Stateless export of annotations kept elsewhere
//! const out = await compilePdf(bytes, JSON.stringify(annotations), false, null);
//! ```

pub mod editor;

use pdfmaster_core::{AnnotationList, CompileConfig, CompileOutput, Plan};
use wasm_bindgen::prelude::*;

pub use editor::EditorHandle;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

pub(crate) fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

pub(crate) fn to_uint8_array(bytes: &[u8]) -> js_sys::Uint8Array {
    let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
    array.copy_from(bytes);
    array
}

/// `null`/`undefined` or an array of page indices
pub(crate) fn page_order_from_js(value: JsValue) -> Result<Option<Vec<usize>>, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid page order: {}", e)))
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen(js_name = quickValidate)]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    pdfmaster_core::quick_validate(bytes).map_err(js_error)
}

/// Get detailed PDF info without opening it in an editor
#[wasm_bindgen(js_name = validatePdf)]
pub fn validate_pdf(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = pdfmaster_core::validate_pdf(bytes).map_err(js_error)?;
    to_js(&info)
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen(js_name = getPageCount)]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pdfmaster_core::get_page_count(bytes).map_err(js_error)
}

/// Page sizes in points, for laying out the annotation overlay
#[wasm_bindgen(js_name = getPageSizes)]
pub fn get_page_sizes(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let sizes = page_sizes_internal(bytes)?;
    to_js(&sizes)
}

fn page_sizes_internal(bytes: &[u8]) -> Result<Vec<pdfmaster_core::PageSize>, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| format!("Failed to parse PDF: {}", e))?;
    Ok(pdfmaster_core::page::page_sizes(&doc))
}

/// Format bytes as human-readable string
#[wasm_bindgen(js_name = formatBytes)]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Internal compile (testable without JsValue)
fn compile_internal(
    bytes: &[u8],
    annotations_json: &str,
    is_pro: bool,
    page_order: Option<&[usize]>,
) -> Result<CompileOutput, String> {
    let annotations = AnnotationList::from_json(annotations_json)
        .map_err(|e| format!("Invalid annotations JSON: {}", e))?;
    pdfmaster_core::compile_with_report(
        bytes,
        annotations.annotations(),
        Plan::from_is_pro(is_pro),
        page_order,
        &CompileConfig::default(),
    )
    .map_err(|e| e.to_string())
}

/// Apply annotations to a PDF and resolve with the final bytes
///
/// `page_order` is accepted and ignored.
#[wasm_bindgen(js_name = compilePdf)]
pub async fn compile_pdf(
    bytes: Vec<u8>,
    annotations_json: String,
    is_pro: bool,
    page_order: JsValue,
) -> Result<js_sys::Uint8Array, JsValue> {
    let page_order = page_order_from_js(page_order)?;

    // Let the caller's pending UI updates land before the synchronous work
    wasm_bindgen_futures::JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL)).await?;

    let output = compile_internal(&bytes, &annotations_json, is_pro, page_order.as_deref())
        .map_err(|e| JsValue::from_str(&e))?;
    Ok(to_uint8_array(&output.bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Create a valid test PDF with the specified number of Letter pages
    pub(crate) fn create_test_pdf(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let page_ids: Vec<Object> = (0..num_pages)
            .map(|_| {
                Object::Reference(doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                }))
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => num_pages as i64,
                "Kids" => page_ids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(2621440), "2.5 MB");
    }

    #[test]
    fn test_get_page_count() {
        assert_eq!(get_page_count(&create_test_pdf(3)).unwrap(), 3);
    }

    #[test]
    fn test_page_sizes_internal() {
        let sizes = page_sizes_internal(&create_test_pdf(2)).unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[0], pdfmaster_core::PageSize::letter());
    }

    #[test]
    fn test_compile_internal_from_json() {
        let pdf = create_test_pdf(1);
        let json = r##"[{"id":"a","type":"text","pageIndex":0,"x":10,"y":10,"content":"Hi","fontSize":12,"color":"#000000","fontFamily":"Helvetica"}]"##;
        let output = compile_internal(&pdf, json, true, None).unwrap();
        assert_eq!(output.report.rendered, 1);
        assert_eq!(output.report.watermarked_pages, 0);
    }

    #[test]
    fn test_compile_internal_rejects_bad_json() {
        let pdf = create_test_pdf(1);
        let err = compile_internal(&pdf, "{not json", false, None).unwrap_err();
        assert!(err.starts_with("Invalid annotations JSON"));
    }

    #[test]
    fn test_compile_internal_watermarks_free_exports() {
        let pdf = create_test_pdf(3);
        let output = compile_internal(&pdf, "[]", false, Some(&[2, 1, 0])).unwrap();
        assert_eq!(output.report.watermarked_pages, 3);
    }

    proptest! {
        #[test]
        fn prop_format_bytes_picks_one_unit(bytes in 0usize..(64 * 1024 * 1024)) {
            let formatted = format_bytes(bytes);
            let unit = if bytes < 1024 {
                " B"
            } else if bytes < 1024 * 1024 {
                " KB"
            } else {
                " MB"
            };
            prop_assert!(formatted.ends_with(unit), "{} -> {}", bytes, formatted);
        }
    }
}

//! Stateful editor handle
//!
//! Wraps `EditorSession` so the whole editor model (document, annotations,
//! tool, gestures, usage) stays in Rust memory between events.

use pdfmaster_core::{
    Annotation, AnnotationList, CompileReport, Config, EditorSession, Plan, ShapeKind, Tool, Usage,
};
use wasm_bindgen::prelude::*;

use crate::{js_error, page_order_from_js, to_js, to_uint8_array};

fn parse_tool(name: &str) -> Result<Tool, String> {
    Tool::parse(name).ok_or_else(|| format!("Unknown tool: {}", name))
}

fn parse_shape_kind(name: &str) -> Result<ShapeKind, String> {
    match name.trim().to_lowercase().as_str() {
        "rectangle" => Ok(ShapeKind::Rectangle),
        "circle" => Ok(ShapeKind::Circle),
        "arrow" => Ok(ShapeKind::Arrow),
        _ => Err(format!("Unknown shape: {}", name)),
    }
}

fn parse_config(config_json: Option<&str>) -> Result<Config, String> {
    match config_json {
        Some(json) if !json.trim().is_empty() => Config::from_json(json).map_err(|e| e.to_string()),
        _ => Ok(Config::default()),
    }
}

/// Editor state for one browser tab
#[wasm_bindgen]
pub struct EditorHandle {
    session: EditorSession,
    last_report: Option<CompileReport>,
    progress_callback: Option<js_sys::Function>,
}

impl EditorHandle {
    /// Internal constructor (testable without JsValue)
    fn with_config(is_pro: bool, config_json: Option<&str>) -> Result<Self, String> {
        let config = parse_config(config_json)?;
        Ok(Self {
            session: EditorSession::new(Plan::from_is_pro(is_pro), config),
            last_report: None,
            progress_callback: None,
        })
    }

    fn restore_annotations_internal(&mut self, json: &str) -> Result<usize, String> {
        let list = AnnotationList::from_json(json)
            .map_err(|e| format!("Invalid annotations JSON: {}", e))?;
        list.annotations()
            .iter()
            .cloned()
            .try_for_each(|annotation: Annotation| {
                self.session
                    .add_annotation(annotation)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })?;
        Ok(self.session.annotations().len())
    }

    fn restore_usage_internal(&mut self, json: &str) -> Result<(), String> {
        let usage: Usage =
            serde_json::from_str(json).map_err(|e| format!("Invalid usage JSON: {}", e))?;
        self.session.set_usage(usage);
        Ok(())
    }

    fn export_internal(&mut self, page_order: Option<&[usize]>) -> Result<Vec<u8>, String> {
        let output = self
            .session
            .export_with_report(page_order)
            .map_err(|e| e.to_string())?;
        self.last_report = Some(output.report);
        Ok(output.bytes)
    }

    /// Report progress to JavaScript callback
    fn report_progress(&self, current: u32, total: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            let this = JsValue::null();
            let _ = callback.call3(
                &this,
                &JsValue::from(current),
                &JsValue::from(total),
                &JsValue::from_str(message),
            );
        }
    }
}

#[wasm_bindgen]
impl EditorHandle {
    /// Create an editor. `config_json` may be null for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(is_pro: bool, config_json: Option<String>) -> Result<EditorHandle, JsValue> {
        Self::with_config(is_pro, config_json.as_deref()).map_err(|e| JsValue::from_str(&e))
    }

    /// Set a progress callback function
    /// Callback signature: (current: number, total: number, message: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    #[wasm_bindgen(getter, js_name = isPro)]
    pub fn is_pro(&self) -> bool {
        self.session.plan().is_pro()
    }

    #[wasm_bindgen(js_name = setPro)]
    pub fn set_pro(&mut self, is_pro: bool) {
        self.session.set_plan(Plan::from_is_pro(is_pro));
    }

    /// Usage record as `{ date, count }`, for the host to persist
    #[wasm_bindgen(js_name = getUsage)]
    pub fn get_usage(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.usage())
    }

    #[wasm_bindgen(js_name = restoreUsage)]
    pub fn restore_usage(&mut self, usage_json: &str) -> Result<(), JsValue> {
        self.restore_usage_internal(usage_json)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Open a PDF. Runs the plan's quota check and returns its info.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&mut self, name: &str, bytes: Vec<u8>) -> Result<JsValue, JsValue> {
        self.last_report = None;
        let info = self.session.load(name, bytes).map_err(js_error)?;
        to_js(info)
    }

    /// Get document bytes for PDF.js rendering
    #[wasm_bindgen(js_name = getDocumentBytes)]
    pub fn get_document_bytes(&self) -> Option<js_sys::Uint8Array> {
        self.session.document_bytes().map(to_uint8_array)
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.session.page_count()
    }

    #[wasm_bindgen(getter, js_name = documentName)]
    pub fn document_name(&self) -> Option<String> {
        self.session.document_name().map(str::to_string)
    }

    #[wasm_bindgen(js_name = downloadName)]
    pub fn download_name(&self) -> Option<String> {
        self.session.download_name()
    }

    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> String {
        self.session.tool().to_string()
    }

    /// Switch tools. Fails with an upgrade message when the plan forbids it.
    #[wasm_bindgen(js_name = selectTool)]
    pub fn select_tool(&mut self, name: &str) -> Result<(), JsValue> {
        let tool = parse_tool(name).map_err(|e| JsValue::from_str(&e))?;
        self.session.select_tool(tool).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, color: &str) {
        self.session.set_color(color);
    }

    #[wasm_bindgen(js_name = setFontSize)]
    pub fn set_font_size(&mut self, size: f64) {
        self.session.set_font_size(size);
    }

    #[wasm_bindgen(js_name = setShapeKind)]
    pub fn set_shape_kind(&mut self, name: &str) -> Result<(), JsValue> {
        let kind = parse_shape_kind(name).map_err(|e| JsValue::from_str(&e))?;
        self.session.set_shape_kind(kind);
        Ok(())
    }

    /// Returns the id of a text annotation placed by the text tool
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, page: u32, x: f64, y: f64) -> Option<String> {
        self.session.pointer_down(page, x, y)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, page: u32, x: f64, y: f64) {
        self.session.pointer_move(page, x, y);
    }

    /// Returns the id of the committed drawing or shape, if any
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, page: u32) -> Option<String> {
        self.session.pointer_up(page)
    }

    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(
        &mut self,
        page: u32,
        x: f64,
        y: f64,
        data_url: &str,
        width: f64,
        height: f64,
    ) -> Result<String, JsValue> {
        self.session
            .add_image(page, x, y, data_url, width, height)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = updateText)]
    pub fn update_text(&mut self, id: &str, content: &str) -> Result<(), JsValue> {
        self.session.update_text(id, content).map_err(js_error)
    }

    #[wasm_bindgen(js_name = moveAnnotation)]
    pub fn move_annotation(&mut self, id: &str, x: f64, y: f64) -> Result<(), JsValue> {
        self.session.move_annotation(id, x, y).map_err(js_error)
    }

    pub fn select(&mut self, id: Option<String>) -> Result<(), JsValue> {
        self.session.select(id.as_deref()).map_err(js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn selected(&self) -> Option<String> {
        self.session.selected().map(str::to_string)
    }

    pub fn remove(&mut self, id: &str) -> Result<(), JsValue> {
        self.session.remove(id).map_err(js_error)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// All annotations as the editor's JSON records
    #[wasm_bindgen(js_name = getAnnotations)]
    pub fn get_annotations(&self) -> Result<String, JsValue> {
        self.session.annotations().to_json().map_err(js_error)
    }

    /// Re-add annotations from a saved draft. Returns the new total.
    #[wasm_bindgen(js_name = restoreAnnotations)]
    pub fn restore_annotations(&mut self, json: &str) -> Result<usize, JsValue> {
        self.restore_annotations_internal(json)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Compile the document with all annotations and return the bytes.
    /// `page_order` may be null; it is accepted and ignored.
    pub fn export(&mut self, page_order: JsValue) -> Result<js_sys::Uint8Array, JsValue> {
        let page_order = page_order_from_js(page_order)?;
        self.report_progress(0, 100, "Applying annotations...");
        let bytes = self
            .export_internal(page_order.as_deref())
            .map_err(|e| JsValue::from_str(&e))?;
        self.report_progress(100, 100, "Complete");
        Ok(to_uint8_array(&bytes))
    }

    /// Report from the most recent export, null before the first one
    #[wasm_bindgen(js_name = lastReport)]
    pub fn last_report(&self) -> Result<JsValue, JsValue> {
        match &self.last_report {
            Some(report) => to_js(report),
            None => Ok(JsValue::NULL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::create_test_pdf;
    use pretty_assertions::assert_eq;

    fn loaded(is_pro: bool) -> EditorHandle {
        let mut handle = EditorHandle::with_config(is_pro, None).unwrap();
        handle
            .session
            .load("contract.pdf", create_test_pdf(2))
            .unwrap();
        handle
    }

    #[test]
    fn test_parse_tool_names() {
        assert_eq!(parse_tool("Draw").unwrap(), Tool::Draw);
        assert!(parse_tool("lasso").is_err());
    }

    #[test]
    fn test_parse_shape_kind() {
        assert_eq!(parse_shape_kind("circle").unwrap(), ShapeKind::Circle);
        assert!(parse_shape_kind("hexagon").is_err());
    }

    #[test]
    fn test_config_json_overrides_defaults() {
        let handle = EditorHandle::with_config(
            false,
            Some(r#"{"quota":{"freeDailyExports":1}}"#),
        )
        .unwrap();
        assert_eq!(handle.session.config().quota.free_daily_exports, 1);
        assert!(EditorHandle::with_config(false, Some("{")).is_err());
        assert!(EditorHandle::with_config(false, Some("  ")).is_ok());
    }

    #[test]
    fn test_export_keeps_last_report() {
        let mut handle = loaded(false);
        let bytes = handle.export_internal(None).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(handle.last_report.as_ref().unwrap().watermarked_pages, 2);
        assert_eq!(handle.session.usage().count, 1);
    }

    #[test]
    fn test_restore_annotations_from_draft() {
        let mut handle = loaded(true);
        let json = r##"[
            {"id":"s1","type":"shape","pageIndex":1,"x":10,"y":10,"shapeType":"rectangle","color":"#000000","thickness":1}
        ]"##;
        assert_eq!(handle.restore_annotations_internal(json).unwrap(), 1);
        assert!(handle.session.annotations().get("s1").is_some());
        assert!(handle.restore_annotations_internal("nope").is_err());
    }

    #[test]
    fn test_restore_usage() {
        let mut handle = loaded(false);
        handle
            .restore_usage_internal(r#"{"date":"2026-01-02","count":3}"#)
            .unwrap();
        assert_eq!(handle.session.usage().count, 3);
        assert!(handle.restore_usage_internal(r#"{"count":3}"#).is_err());
    }
}

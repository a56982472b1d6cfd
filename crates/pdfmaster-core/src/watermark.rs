//! Free-plan watermark stage

use crate::color::Rgb;
use crate::config::WatermarkConfig;
use crate::error::CompileError;
use crate::fonts::StandardFont;
use crate::plan::Plan;
use crate::render::{Renderer, TextRun};

/// Stamp every page when the plan is free. Returns the number of pages
/// stamped; pro plans stamp nothing.
pub fn apply_watermark(
    renderer: &mut Renderer<'_>,
    plan: Plan,
    config: &WatermarkConfig,
) -> Result<usize, CompileError> {
    if plan.is_pro() {
        return Ok(0);
    }

    let gray = config.gray;
    for page_index in 0..renderer.page_count() {
        let size = renderer.page_size(page_index)?;
        renderer.draw_text(
            page_index,
            &TextRun {
                text: &config.text,
                font: StandardFont::HelveticaBold,
                size: config.font_size,
                color: Rgb::new(gray, gray, gray),
                x: size.width / 2.0 + config.center_offset,
                y: config.baseline,
                opacity: Some(config.opacity),
            },
        )?;
    }
    Ok(renderer.page_count())
}

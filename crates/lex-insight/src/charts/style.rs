//! Colors, fonts and the SVG canvas shared by every chart.

use crate::error::{InsightError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

pub(crate) const FONT: &str = "sans-serif";

pub(crate) type Canvas<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Categorical palette (matplotlib tab10).
pub(crate) const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const NEGATIVE_END: (f64, f64, f64) = (59.0, 76.0, 192.0);
const POSITIVE_END: (f64, f64, f64) = (180.0, 4.0, 38.0);

pub(crate) fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Blue-white-red scale for a coefficient in [-1, 1].
pub(crate) fn diverging(r: f64) -> RGBColor {
    let t = r.clamp(-1.0, 1.0);
    let end = if t < 0.0 { NEGATIVE_END } else { POSITIVE_END };
    let w = t.abs();
    let mix = |c: f64| (255.0 + (c - 255.0) * w).round() as u8;
    RGBColor(mix(end.0), mix(end.1), mix(end.2))
}

pub(crate) fn centered(size: u32) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

/// Axis range around `[min, max]` with a 5% margin; degenerate spans widen by one unit.
pub(crate) fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span == 0.0 {
        return (min - 1.0, max + 1.0);
    }
    (min - span * 0.05, max + span * 0.05)
}

/// Upper bound for a segmented axis holding `n` categories.
pub(crate) fn category_upper(n: usize) -> u32 {
    n.saturating_sub(1).max(1) as u32
}

/// Label formatter that names segment centers.
pub(crate) fn category_labels(names: &[String]) -> impl Fn(&SegmentValue<u32>) -> String + '_ {
    move |value: &SegmentValue<u32>| match value {
        SegmentValue::CenterOf(i) => names.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Draw into an in-memory SVG and write it to `path`.
///
/// The drawing area lives only inside this call, on success and on error.
pub(crate) fn render_svg<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&Canvas<'_>) -> Result<()>,
{
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            InsightError::Render(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    std::fs::write(path, buffer)
        .map_err(|e| InsightError::Render(format!("cannot write {}: {}", path.display(), e)))
}

/// Title plus a centered message, for empty or degenerate data.
pub(crate) fn draw_placeholder(root: &Canvas<'_>, title: &str, note: &str) -> Result<()> {
    let (width, height) = root.dim_in_pixel();
    let cx = width as i32 / 2;
    root.draw(&Text::new(title.to_string(), (cx, 40), centered(24)))?;
    root.draw(&Text::new(
        format!("No chart: {}", note),
        (cx, height as i32 / 2),
        centered(18),
    ))?;
    Ok(())
}

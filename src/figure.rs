//! Chart descriptions and PNG rendering
//!
//! Figures are stored as plain data and rasterized on demand, so the plot
//! endpoints always serve a freshly encoded PNG instead of a cached blob.
//! Charts are drawn without any text; captions belong to the page that
//! embeds the image.

use std::io::Cursor;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;

/// Served plot width in pixels
pub const PLOT_WIDTH: u32 = 640;
/// Served plot height in pixels
pub const PLOT_HEIGHT: u32 = 480;

// ggplot palette: gray panel, red bars, blue histogram
const PANEL_BG: RGBColor = RGBColor(229, 229, 229);
const BAR_RED: RGBColor = RGBColor(226, 74, 51);
const HIST_BLUE: RGBColor = RGBColor(52, 138, 189);

#[derive(Debug, Error)]
pub enum FigureError {
    /// Chart drawing failed
    #[error("Drawing error: {0}")]
    Draw(String),

    /// Rasterized pixels could not be encoded as PNG
    #[error("PNG encoding error: {0}")]
    Encode(String),
}

/// One histogram bin: half-open value range and the number of rows in it
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// A chart the application can draw
#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    /// Labeled bars, one per category, in first-appearance order
    Bar {
        title: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    /// Equal-width bins over a numeric column
    Histogram { title: String, bins: Vec<HistogramBin> },
}

impl Figure {
    /// Caption text for the page that embeds this chart
    pub fn title(&self) -> &str {
        match self {
            Figure::Bar { title, .. } => title,
            Figure::Histogram { title, .. } => title,
        }
    }

    /// Rasterize the chart into PNG bytes
    pub fn render_png(&self, width: u32, height: u32) -> Result<Vec<u8>, FigureError> {
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            match self {
                Figure::Bar { values, .. } => draw_bars(&root, values)?,
                Figure::Histogram { bins, .. } => draw_histogram(&root, bins)?,
            }
            root.present().map_err(|e| FigureError::Draw(e.to_string()))?;
        }

        let img = image::RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| FigureError::Encode("pixel buffer size mismatch".to_string()))?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| FigureError::Encode(e.to_string()))?;
        Ok(png)
    }
}

/// Horizontal white guide lines across the panel, ggplot style
fn draw_guides<DB: DrawingBackend>(
    chart: &mut ChartContext<DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    x_range: (f64, f64),
    y_max: f64,
) -> Result<(), FigureError> {
    for step in 1..5 {
        let y = y_max * f64::from(step) / 5.0;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x_range.0, y), (x_range.1, y)],
                WHITE.stroke_width(1),
            )))
            .map_err(|e| FigureError::Draw(e.to_string()))?;
    }
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    values: &[f64],
) -> Result<(), FigureError> {
    root.fill(&PANEL_BG)
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    let bar_count = values.len().max(1) as f64;
    let y_max = values.iter().cloned().fold(0.0_f64, f64::max).max(1.0) * 1.08;

    let mut chart = ChartBuilder::on(root)
        .margin(24)
        .build_cartesian_2d(0.0..bar_count, 0.0..y_max)
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    draw_guides(&mut chart, (0.0, bar_count), y_max)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            let left = i as f64 + 0.12;
            let right = i as f64 + 0.88;
            Rectangle::new([(left, 0.0), (right, *v)], BAR_RED.filled())
        }))
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    // Baseline under the bars
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (bar_count, 0.0)],
            BLACK.stroke_width(1),
        )))
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    bins: &[HistogramBin],
) -> Result<(), FigureError> {
    root.fill(&PANEL_BG)
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    let x_min = bins.first().map(|b| b.start).unwrap_or(0.0);
    let x_max = bins.last().map(|b| b.end).unwrap_or(1.0);
    // Pad a collapsed range so the coordinate system stays non-degenerate
    let (x_lo, x_hi) = if x_max > x_min {
        (x_min, x_max)
    } else {
        (x_min - 0.5, x_min + 0.5)
    };
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.08;

    let mut chart = ChartBuilder::on(root)
        .margin(24)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    draw_guides(&mut chart, (x_lo, x_hi), y_max)?;

    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                HIST_BLUE.filled(),
            )
        }))
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    // White separators make adjacent bins readable
    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                WHITE.stroke_width(1),
            )
        }))
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(x_lo, 0.0), (x_hi, 0.0)],
            BLACK.stroke_width(1),
        )))
        .map_err(|e| FigureError::Draw(e.to_string()))?;

    Ok(())
}

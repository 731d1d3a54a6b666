use crate::domain::report::{DepartmentCount, DepartmentSalary, TopEarner};
use crate::utils::error::{ReportError, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle, FontTransform};
use std::sync::OnceLock;

pub const BAR_CHART_FILE: &str = "base_salary_by_division.png";
pub const PIE_CHART_FILE: &str = "employee_distribution_by_department.png";
pub const BOX_PLOT_FILE: &str = "salary_distribution_by_department.png";

/// Figure sizes at 100 dpi: 12x6 and 8x8 inches.
pub const WIDE_SIZE: (u32, u32) = (1200, 600);
pub const SQUARE_SIZE: (u32, u32) = (800, 800);

const FONT_FAMILY: &str = "sans-serif";
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);
const GRID_GRAY: RGBColor = RGBColor(176, 176, 176);
const PIE_PALETTE: [RGBColor; 10] = [
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

const BAR_WIDTH: f64 = 0.8;
const BOX_WIDTH: f64 = 0.6;
const PIE_START_ANGLE: f64 = 140.0;
const MAX_Y_TICKS: usize = 8;

type Root<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Plot<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type DrawResult<T = ()> = std::result::Result<T, Box<dyn std::error::Error>>;

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Fonts are registered once per process; the first caller's `font_path` wins.
fn ensure_font(font_path: Option<&str>) -> bool {
    *FONT_READY.get_or_init(|| {
        for path in font_path.into_iter().chain(SYSTEM_FONTS.iter().copied()) {
            match std::fs::read(path) {
                Ok(bytes) => {
                    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                    if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                        tracing::debug!("Using chart font {}", path);
                        return true;
                    }
                    tracing::warn!("⚠️ {} is not a usable TrueType font", path);
                }
                Err(e) if font_path == Some(path) => {
                    tracing::warn!("⚠️ Cannot read configured font {}: {}", path, e);
                }
                Err(_) => {}
            }
        }
        tracing::warn!("⚠️ No TrueType font found, charts are rendered without text");
        false
    })
}

/// Five-number summary of a box, quartiles by linear interpolation and
/// whiskers at the most extreme samples within 1.5 IQR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * p / 100.0;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl BoxSummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = percentile(&sorted, 25.0);
        let median = percentile(&sorted, 50.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|v| *v >= q1 - 1.5 * iqr)
            .filter(|v| *v <= q1)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= q3 + 1.5 * iqr)
            .filter(|v| *v >= q3)
            .unwrap_or(q3);

        Some(Self {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
        })
    }
}

/// Angular extent of a pie slice in degrees, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieSlice {
    pub start: f64,
    pub end: f64,
    pub fraction: f64,
}

pub fn pie_slices(sizes: &[f64], start_angle: f64) -> Vec<PieSlice> {
    let total: f64 = sizes.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut angle = start_angle;
    sizes
        .iter()
        .map(|size| {
            let fraction = size / total;
            let slice = PieSlice {
                start: angle,
                end: angle + 360.0 * fraction,
                fraction,
            };
            angle = slice.end;
            slice
        })
        .collect()
}

/// Round tick positions covering `[lo, hi]` with at most `max_ticks` steps.
pub fn nice_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 || max_ticks == 0 {
        return vec![lo];
    }

    let magnitude = 10f64.powf((span / max_ticks as f64).log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| span / step <= max_ticks as f64)
        .unwrap_or(10.0 * magnitude);

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn shorten(label: &str, max_chars: usize) -> String {
    if label.chars().count() > max_chars {
        let mut short: String = label.chars().take(max_chars - 3).collect();
        short.push_str("...");
        short
    } else {
        label.to_string()
    }
}

/// Value range padded by 5% on both sides, never empty.
fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        (lo.abs() * 0.05).max(1.0)
    };
    (lo - pad, hi + pad)
}

/// Drawing surface. All text goes through here so charts still render
/// geometry when no font is available.
struct Canvas<'r, 'b> {
    root: &'r Root<'b>,
    text: bool,
}

impl Canvas<'_, '_> {
    fn text(
        &self,
        text: &str,
        pos: (i32, i32),
        size: u32,
        anchor: Pos,
        transform: FontTransform,
    ) -> DrawResult {
        if !self.text || text.is_empty() {
            return Ok(());
        }
        let style = (FONT_FAMILY, f64::from(size))
            .into_font()
            .transform(transform)
            .color(&BLACK)
            .pos(anchor);
        self.root.draw(&Text::new(text.to_string(), pos, style))?;
        Ok(())
    }

    fn title(&self, title: &str) -> DrawResult {
        let (width, _) = self.root.dim_in_pixel();
        self.text(
            title,
            (width as i32 / 2, 16),
            26,
            Pos::new(HPos::Center, VPos::Top),
            FontTransform::None,
        )
    }

    fn line(&self, points: Vec<(i32, i32)>, style: ShapeStyle) -> DrawResult {
        self.root.draw(&PathElement::new(points, style))?;
        Ok(())
    }

    fn dashed_hline(&self, y: i32, x0: i32, x1: i32) -> DrawResult {
        const DASH: i32 = 8;
        const GAP: i32 = 5;
        let style = GRID_GRAY.mix(0.7).stroke_width(1);
        let mut x = x0;
        while x < x1 {
            self.line(vec![(x, y), ((x + DASH).min(x1), y)], style)?;
            x += DASH + GAP;
        }
        Ok(())
    }

    /// Frame, dashed y gridlines, y ticks and axis descriptions around a plot.
    fn axes(
        &self,
        chart: &Plot<'_, '_>,
        x: (f64, f64),
        y: (f64, f64),
        x_desc: &str,
        y_desc: &str,
    ) -> DrawResult<(i32, i32, i32, i32)> {
        let (left, top) = chart.backend_coord(&(x.0, y.1));
        let (right, bottom) = chart.backend_coord(&(x.1, y.0));

        for tick in nice_ticks(y.0, y.1, MAX_Y_TICKS) {
            let (_, py) = chart.backend_coord(&(x.0, tick));
            self.dashed_hline(py, left, right)?;
            self.line(vec![(left - 5, py), (left, py)], BLACK.stroke_width(1))?;
            self.text(
                &format_tick(tick),
                (left - 8, py),
                14,
                Pos::new(HPos::Right, VPos::Center),
                FontTransform::None,
            )?;
        }

        self.root.draw(&Rectangle::new(
            [(left, top), (right, bottom)],
            BLACK.stroke_width(1),
        ))?;

        let (_, height) = self.root.dim_in_pixel();
        self.text(
            x_desc,
            ((left + right) / 2, height as i32 - 8),
            18,
            Pos::new(HPos::Center, VPos::Bottom),
            FontTransform::None,
        )?;
        self.text(
            y_desc,
            (22, (top + bottom) / 2),
            18,
            Pos::new(HPos::Center, VPos::Center),
            FontTransform::Rotate270,
        )?;

        Ok((left, top, right, bottom))
    }
}

/// Categorical axis positions: equal labels share one slot, slots in order of
/// first appearance.
fn category_slots(labels: &[String]) -> (Vec<usize>, Vec<&str>) {
    let mut categories: Vec<&str> = Vec::new();
    let slots = labels
        .iter()
        .map(|label| match categories.iter().position(|c| *c == label.as_str()) {
            Some(slot) => slot,
            None => {
                categories.push(label);
                categories.len() - 1
            }
        })
        .collect();
    (slots, categories)
}

fn draw_bar_chart(canvas: &Canvas<'_, '_>, labels: &[String], values: &[Option<f64>]) -> DrawResult {
    let (slots, categories) = category_slots(labels);
    let x = (-0.5, categories.len().max(1) as f64 - 0.5);
    let peak = values.iter().flatten().copied().fold(0.0, f64::max);
    let y = (0.0, if peak > 0.0 { peak * 1.05 } else { 1.0 });

    let mut chart = ChartBuilder::on(canvas.root)
        .margin_top(60)
        .margin_right(30)
        .x_label_area_size(70)
        .y_label_area_size(110)
        .build_cartesian_2d(x.0..x.1, y.0..y.1)?;

    canvas.title("Top Paid Divisions by Base Salary")?;
    let (_, _, _, bottom) = canvas.axes(&chart, x, y, "Division", "Base Salary")?;

    let half = BAR_WIDTH / 2.0;
    let bars = values.iter().zip(&slots).filter_map(|(value, slot)| {
        value.map(|v| {
            let center = *slot as f64;
            Rectangle::new([(center - half, 0.0), (center + half, v)], SKY_BLUE.filled())
        })
    });
    chart.draw_series(bars)?;

    for (i, label) in categories.iter().enumerate() {
        let (px, _) = chart.backend_coord(&(i as f64, 0.0));
        canvas.text(
            &shorten(label, 28),
            (px, bottom + 10),
            14,
            Pos::new(HPos::Center, VPos::Top),
            FontTransform::None,
        )?;
    }

    Ok(())
}

fn draw_pie_chart(canvas: &Canvas<'_, '_>, labels: &[String], sizes: &[f64]) -> DrawResult {
    canvas.title("Employee Distribution by Department")?;

    let (width, height) = canvas.root.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0 + 20.0);
    let radius = width.min(height) as f64 * 0.32;
    let polar = |r: f64, angle: f64| -> (i32, i32) {
        let rad = angle.to_radians();
        (
            (center.0 + r * rad.cos()).round() as i32,
            (center.1 - r * rad.sin()).round() as i32,
        )
    };

    for (i, slice) in pie_slices(sizes, PIE_START_ANGLE).iter().enumerate() {
        let sweep = slice.end - slice.start;
        if sweep > 0.0 {
            let steps = sweep.ceil().max(1.0) as usize;
            let mut points = vec![polar(0.0, 0.0)];
            points.extend(
                (0..=steps).map(|s| polar(radius, slice.start + sweep * s as f64 / steps as f64)),
            );
            let color = PIE_PALETTE[i % PIE_PALETTE.len()];
            canvas.root.draw(&Polygon::new(points, color.filled()))?;
        }

        let mid = (slice.start + slice.end) / 2.0;
        let h_pos = if mid.to_radians().cos() > 0.0 {
            HPos::Left
        } else {
            HPos::Right
        };
        if let Some(label) = labels.get(i) {
            canvas.text(
                &shorten(label, 32),
                polar(radius * 1.1, mid),
                14,
                Pos::new(h_pos, VPos::Center),
                FontTransform::None,
            )?;
        }
        canvas.text(
            &format!("{:.1}%", slice.fraction * 100.0),
            polar(radius * 0.6, mid),
            13,
            Pos::new(HPos::Center, VPos::Center),
            FontTransform::None,
        )?;
    }

    Ok(())
}

fn draw_box_plot(canvas: &Canvas<'_, '_>, labels: &[String], boxes: &[Option<BoxSummary>]) -> DrawResult {
    let x = (0.5, boxes.len().max(1) as f64 + 0.5);
    let y = padded_bounds(
        boxes
            .iter()
            .flatten()
            .flat_map(|b| [b.whisker_low, b.whisker_high]),
    );

    let chart = ChartBuilder::on(canvas.root)
        .margin_top(60)
        .margin_right(30)
        .x_label_area_size(200)
        .y_label_area_size(110)
        .build_cartesian_2d(x.0..x.1, y.0..y.1)?;

    canvas.title("Salary Distribution by Department")?;
    let (_, _, _, bottom) = canvas.axes(&chart, x, y, "Department", "Salary")?;

    let area = chart.plotting_area();
    let half = BOX_WIDTH / 2.0;
    let cap = BOX_WIDTH / 4.0;
    for (i, summary) in boxes.iter().enumerate() {
        let Some(b) = summary else { continue };
        let pos = (i + 1) as f64;
        let whisker = BLACK.stroke_width(1);

        area.draw(&PathElement::new(vec![(pos, b.whisker_low), (pos, b.q1)], whisker))?;
        area.draw(&PathElement::new(vec![(pos, b.q3), (pos, b.whisker_high)], whisker))?;
        for end in [b.whisker_low, b.whisker_high] {
            area.draw(&PathElement::new(vec![(pos - cap, end), (pos + cap, end)], whisker))?;
        }
        area.draw(&Rectangle::new(
            [(pos - half, b.q1), (pos + half, b.q3)],
            LIGHT_BLUE.filled(),
        ))?;
        area.draw(&Rectangle::new(
            [(pos - half, b.q1), (pos + half, b.q3)],
            BLACK.stroke_width(1),
        ))?;
        area.draw(&PathElement::new(
            vec![(pos - half, b.median), (pos + half, b.median)],
            RED.stroke_width(2),
        ))?;
    }

    for (i, label) in labels.iter().enumerate() {
        let (px, _) = chart.backend_coord(&((i + 1) as f64, y.0));
        canvas.text(
            &shorten(label, 24),
            (px, bottom + 8),
            13,
            Pos::new(HPos::Right, VPos::Center),
            FontTransform::Rotate270,
        )?;
    }

    Ok(())
}

fn encode_png(rgb: &[u8], (width, height): (u32, u32)) -> std::result::Result<Vec<u8>, png::EncodingError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgb)?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Renders aggregation results to PNG bytes.
#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    text: bool,
}

impl ChartRenderer {
    pub fn new(font_path: Option<&str>) -> Self {
        Self {
            text: ensure_font(font_path),
        }
    }

    pub fn without_text() -> Self {
        Self { text: false }
    }

    pub fn draws_text(&self) -> bool {
        self.text
    }

    fn render<F>(&self, chart: &str, size: (u32, u32), draw: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&Canvas<'_, '_>) -> DrawResult,
    {
        let mut buffer = vec![0u8; size.0 as usize * size.1 as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            root.fill(&WHITE).map_err(|e| ReportError::render(chart, e))?;
            let canvas = Canvas {
                root: &root,
                text: self.text,
            };
            draw(&canvas).map_err(|e| ReportError::render(chart, e))?;
            root.present().map_err(|e| ReportError::render(chart, e))?;
        }

        let png = encode_png(&buffer, size).map_err(|e| ReportError::render(chart, e))?;
        tracing::debug!("Rendered {} ({} bytes)", chart, png.len());
        Ok(png)
    }

    pub fn bar_chart(&self, top_paid: &[TopEarner]) -> Result<Vec<u8>> {
        let labels: Vec<String> = top_paid.iter().map(|t| t.division.to_string()).collect();
        let values: Vec<Option<f64>> = top_paid.iter().map(|t| t.salary).collect();
        self.render(BAR_CHART_FILE, WIDE_SIZE, |canvas| {
            draw_bar_chart(canvas, &labels, &values)
        })
    }

    pub fn pie_chart(&self, counts: &[DepartmentCount]) -> Result<Vec<u8>> {
        let labels: Vec<String> = counts.iter().map(|c| c.department.to_string()).collect();
        let sizes: Vec<f64> = counts.iter().map(|c| c.employees as f64).collect();
        self.render(PIE_CHART_FILE, SQUARE_SIZE, |canvas| {
            draw_pie_chart(canvas, &labels, &sizes)
        })
    }

    /// One box per department from its (min, max, avg) triple.
    pub fn box_plot(&self, departments: &[DepartmentSalary]) -> Result<Vec<u8>> {
        let labels: Vec<String> = departments
            .iter()
            .map(|d| d.department.to_string())
            .collect();
        let boxes: Vec<Option<BoxSummary>> = departments
            .iter()
            .map(|d| match (d.min, d.max, d.avg) {
                (Some(min), Some(max), Some(avg)) => BoxSummary::from_samples(&[min, max, avg]),
                _ => None,
            })
            .collect();
        self.render(BOX_PLOT_FILE, WIDE_SIZE, |canvas| {
            draw_box_plot(canvas, &labels, &boxes)
        })
    }
}

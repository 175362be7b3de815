//! SVG chart of the minimum displacement per cycle.

use std::path::Path;

use log::info;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Line, Path as SvgPath, Rectangle, Text};
use svg::Document;

use crate::error::Result;
use crate::failure::FailureResult;
use crate::numbers;
use crate::table::CycleTable;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN: f64 = 60.0;

/// Maps data coordinates onto the plot area.
struct Frame {
    x_lo: f64,
    x_hi: f64,
    y_lo: f64,
    y_hi: f64,
}

impl Frame {
    fn new(x: &[f64], y: &[f64]) -> Option<Frame> {
        let (mut x_lo, mut x_hi) = (numbers::min(x)?, numbers::max(x)?);
        let (mut y_lo, mut y_hi) = (numbers::min(y)?, numbers::max(y)?);
        if x_hi <= x_lo {
            x_lo -= 0.5;
            x_hi += 0.5;
        }
        if y_hi <= y_lo {
            y_lo -= 0.5;
            y_hi += 0.5;
        }
        Some(Frame { x_lo, x_hi, y_lo, y_hi })
    }

    fn point(&self, x: f64, y: f64) -> (f32, f32) {
        let px = MARGIN + (x - self.x_lo) / (self.x_hi - self.x_lo) * (WIDTH - 2.0 * MARGIN);
        let py = HEIGHT - MARGIN - (y - self.y_lo) / (self.y_hi - self.y_lo) * (HEIGHT - 2.0 * MARGIN);
        (px as f32, py as f32)
    }
}

fn label(x: f64, y: f64, anchor: &str, content: &str) -> Text {
    Text::new()
        .set("x", x)
        .set("y", y)
        .set("font-family", "sans-serif")
        .set("font-size", 14)
        .set("text-anchor", anchor)
        .add(svg::node::Text::new(content))
}

/// Build the chart document. An empty table gives empty axes.
pub fn chart_document(table: &CycleTable, failure: Option<&FailureResult>, title: &str) -> Document {
    let bottom = HEIGHT - MARGIN;
    let right = WIDTH - MARGIN;
    let mut document = Document::new()
        .set("viewBox", (0, 0, WIDTH as i32, HEIGHT as i32))
        .add(Rectangle::new().set("width", "100%").set("height", "100%").set("fill", "white"))
        .add(Line::new().set("x1", MARGIN).set("y1", bottom).set("x2", right).set("y2", bottom).set("stroke", "black"))
        .add(Line::new().set("x1", MARGIN).set("y1", MARGIN).set("x2", MARGIN).set("y2", bottom).set("stroke", "black"))
        .add(label(WIDTH / 2.0, MARGIN / 2.0, "middle", title))
        .add(label(WIDTH / 2.0, HEIGHT - 15.0, "middle", "Cycle"))
        .add(
            label(15.0, HEIGHT / 2.0, "middle", "Disp. min. (mm)")
                .set("transform", format!("rotate(-90 15 {})", HEIGHT / 2.0)),
        );

    let cycles: Vec<f64> = table.rows().iter().map(|m| m.cycle as f64).collect();
    let disp_min: Vec<f64> = table.rows().iter().map(|m| m.disp_min).collect();
    let frame = match Frame::new(&cycles, &disp_min) {
        Some(frame) => frame,
        None => return document.add(label(WIDTH / 2.0, HEIGHT / 2.0, "middle", "no cycles")),
    };

    let mut data = Data::new().move_to(frame.point(cycles[0], disp_min[0]));
    for (&c, &d) in cycles.iter().zip(&disp_min).skip(1) {
        data = data.line_to(frame.point(c, d));
    }
    document = document
        .add(
            SvgPath::new()
                .set("fill", "none")
                .set("stroke", "steelblue")
                .set("stroke-width", 1.5)
                .set("d", data),
        )
        .add(label(MARGIN, bottom + 20.0, "start", &format!("{}", frame.x_lo)))
        .add(label(right, bottom + 20.0, "end", &format!("{}", frame.x_hi)))
        .add(label(MARGIN - 5.0, bottom, "end", &format!("{:.3}", frame.y_lo)))
        .add(label(MARGIN - 5.0, MARGIN, "end", &format!("{:.3}", frame.y_hi)));

    for (&c, &d) in cycles.iter().zip(&disp_min) {
        let (px, py) = frame.point(c, d);
        document = document.add(Circle::new().set("cx", px).set("cy", py).set("r", 2).set("fill", "steelblue"));
    }

    if let Some(f) = failure {
        let (px, py) = frame.point(f.failure_cycle as f64, f.failure_displacement);
        let marker = Circle::new()
            .set("cx", px)
            .set("cy", py)
            .set("r", 6)
            .set("fill", "none")
            .set("stroke", "red")
            .set("stroke-width", 2);
        let text = format!("failure: cycle {}, {:.4} mm", f.failure_cycle, f.failure_displacement);
        document = document
            .add(marker)
            .add(label(f64::from(px) + 8.0, f64::from(py) - 8.0, "start", &text).set("fill", "red"));
    }

    document
}

/// Write the chart as an SVG file.
pub fn write_svg_chart<P: AsRef<Path>>(
    path: P,
    table: &CycleTable,
    failure: Option<&FailureResult>,
    title: &str,
) -> Result<()> {
    let document = chart_document(table, failure, title);
    svg::save(path.as_ref(), &document)?;
    info!("chart written to '{}'", path.as_ref().display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::CycleMetrics;
    use crate::table;
    use std::fs;
    use tempdir::TempDir;

    fn metrics(cycle: u64, disp_min: f64) -> CycleMetrics {
        CycleMetrics {
            cycle,
            disp_amp: 0.1,
            force_amp: 1.0,
            disp_max: disp_min + 0.2,
            disp_min,
            force_max: 1.0,
            force_min: -1.0,
            stress: None,
            loop_area: 0.0,
            phase: None,
            loading_rate: 0.0,
        }
    }

    #[test]
    fn chart_marks_the_failure_point() {
        let dir = TempDir::new("mtscyclic").unwrap();
        let path = dir.path().join("chart.svg");
        let table = table::build((1..=10).map(|c| metrics(c * 1000, -0.01 * c as f64)), None).unwrap();
        let failure = FailureResult {
            failure_cycle: 7000,
            failure_displacement: -0.07,
        };

        write_svg_chart(&path, &table, Some(&failure), "specimen 7").unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("specimen 7"));
        assert!(svg.contains("failure: cycle 7000"));
        assert_eq!(svg.matches("<circle").count(), 11);
    }

    #[test]
    fn single_cycle_chart_has_no_failure_marker() {
        let table = table::build(vec![metrics(5, 1.0)], None).unwrap();

        let document = chart_document(&table, None, "one").to_string();
        assert_eq!(document.matches("<circle").count(), 1);
        assert!(!document.contains("failure"));
    }

    #[test]
    fn empty_table_gives_empty_axes() {
        let table = table::build(Vec::new(), None).unwrap();
        let document = chart_document(&table, None, "none").to_string();
        assert!(document.contains("no cycles"));
        assert_eq!(document.matches("<circle").count(), 0);
    }
}

//! SVG pie chart of the bias triple.
//!
//! The chart is plain declarative SVG (one `<path>` per slice plus a legend)
//! so it can be inlined into the HTML results page without any scripting.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::models::{BiasCategory, BiasScores};

const WIDTH: f64 = 460.0;
const HEIGHT: f64 = 300.0;
const CX: f64 = 150.0;
const CY: f64 = 150.0;
const RADIUS: f64 = 130.0;
/// Slices smaller than this share (percent) get no inline label.
const MIN_LABEL_PERCENT: f64 = 5.0;

/// Point on the circle at `angle` radians, measured clockwise from 12 o'clock.
fn polar(radius: f64, angle: f64) -> (f64, f64) {
    (CX + radius * angle.sin(), CY - radius * angle.cos())
}

/// Render `scores` as a standalone `<svg>` element.
pub fn pie_svg(scores: &BiasScores) -> String {
    let scores = scores.normalized();
    let total = scores.total();
    let mut svg = String::new();

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="bias-chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="Political bias distribution">"#
    )
    .unwrap();

    let mut start = 0.0_f64;
    let mut labels = String::new();
    for category in BiasCategory::ALL {
        let value = scores.get(category);
        if value <= 0.0 {
            continue;
        }
        let share = value / total;
        let sweep = share * 2.0 * PI;
        let color = category.color();
        let name = category.display_label();

        if share >= 0.9999 {
            writeln!(
                svg,
                r#"  <circle cx="{CX}" cy="{CY}" r="{RADIUS}" fill="{color}"><title>{name}: {value:.3}%</title></circle>"#
            )
            .unwrap();
        } else {
            let end = start + sweep;
            let (x1, y1) = polar(RADIUS, start);
            let (x2, y2) = polar(RADIUS, end);
            let large_arc = if sweep > PI { 1 } else { 0 };
            writeln!(
                svg,
                r#"  <path d="M {CX} {CY} L {x1:.2} {y1:.2} A {RADIUS} {RADIUS} 0 {large_arc} 1 {x2:.2} {y2:.2} Z" fill="{color}" stroke="white" stroke-width="2"><title>{name}: {value:.3}%</title></path>"#
            )
            .unwrap();
        }

        if value >= MIN_LABEL_PERCENT {
            let (lx, ly) = if share >= 0.9999 {
                (CX, CY)
            } else {
                polar(RADIUS * 0.62, start + sweep / 2.0)
            };
            writeln!(
                labels,
                r#"  <text x="{lx:.2}" y="{ly:.2}" text-anchor="middle" fill="white" font-size="13" font-family="Arial, sans-serif"><tspan x="{lx:.2}">{name}</tspan><tspan x="{lx:.2}" dy="16">{value:.1}%</tspan></text>"#
            )
            .unwrap();
        }

        start += sweep;
    }
    svg.push_str(&labels);

    for (i, category) in BiasCategory::ALL.iter().enumerate() {
        let y = 110.0 + i as f64 * 28.0;
        writeln!(
            svg,
            r##"  <rect x="310" y="{y}" width="14" height="14" rx="3" fill="{}"/><text x="332" y="{}" font-size="13" font-family="Arial, sans-serif" fill="#1f2937">{} ({:.1}%)</text>"##,
            category.color(),
            y + 12.0,
            category.display_label(),
            scores.get(*category)
        )
        .unwrap();
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_slices() {
        let svg = pie_svg(&BiasScores {
            left: 50.0,
            neutral: 30.0,
            right: 20.0,
        });
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains("#dc2626"));
        assert!(svg.contains("#2563eb"));
        assert!(svg.contains("#059669"));
        assert!(svg.contains("Left Bias: 50.000%"));
    }

    #[test]
    fn test_first_slice_starts_at_top() {
        let svg = pie_svg(&BiasScores {
            left: 25.0,
            neutral: 50.0,
            right: 25.0,
        });
        // 12 o'clock, then a quarter turn to 3 o'clock
        assert!(svg.contains("M 150 150 L 150.00 20.00 A 130 130 0 0 1 280.00 150.00 Z"));
    }

    #[test]
    fn test_large_arc_flag() {
        let svg = pie_svg(&BiasScores {
            left: 70.0,
            neutral: 20.0,
            right: 10.0,
        });
        assert!(svg.contains("A 130 130 0 1 1"));
    }

    #[test]
    fn test_single_full_slice_is_circle() {
        let svg = pie_svg(&BiasScores {
            left: 0.0,
            neutral: 0.0,
            right: 100.0,
        });
        assert_eq!(svg.matches("<path").count(), 0);
        assert_eq!(svg.matches("<circle").count(), 1);
        // legend still lists all three
        assert!(svg.contains("Left Bias (0.0%)"));
    }

    #[test]
    fn test_small_slice_unlabelled() {
        let svg = pie_svg(&BiasScores {
            left: 2.0,
            neutral: 90.0,
            right: 8.0,
        });
        assert_eq!(svg.matches("<tspan x=").count(), 4);
    }
}

//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized (snapshot-style tests below)

use crate::app::pipeline::ProjectionRun;
use crate::data::SectorShare;
use crate::domain::{Airport, Projection, ProjectionConfig};
use crate::io::ingest::RowError;
use crate::report::checkpoint_years;

/// Unit appended to every emissions value shown to the user.
pub const UNIT: &str = "Tonnes";

/// Max number of skipped rows listed individually in the summary.
const MAX_ROW_ERRORS_SHOWN: usize = 5;

/// Format `v` with `,` thousands separators and `decimals` fractional digits.
///
/// `fmt_thousands(37_791_567_000.0, 2) == "37,791,567,000.00"`
pub fn fmt_thousands(v: f64, decimals: usize) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let raw = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // `-0.00` reads as noise; only keep the sign when something non-zero is shown.
    let negative = v < 0.0 && raw.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    out
}

/// Tooltip text for one projected point.
pub fn hover_label(entity: &str, year: i32, value: f64) -> String {
    format!(
        "Region: {entity}\nYear: {year}\nEmissions: {} {UNIT}",
        fmt_thousands(value, 2)
    )
}

/// Compact engineering-style value (`37.8G`), used on plot axes.
pub fn fmt_compact(v: f64) -> String {
    let a = v.abs();
    let (scaled, suffix) = if a >= 1e12 {
        (v / 1e12, "T")
    } else if a >= 1e9 {
        (v / 1e9, "G")
    } else if a >= 1e6 {
        (v / 1e6, "M")
    } else if a >= 1e3 {
        (v / 1e3, "k")
    } else {
        (v, "")
    };
    format!("{scaled:.1}{suffix}")
}

/// Format the run summary: per-entity parameters, quality and checkpoint values.
pub fn format_run_summary(
    run: &ProjectionRun,
    value_label: &str,
    config: &ProjectionConfig,
    row_errors: &[RowError],
) -> String {
    let mut out = String::new();

    out.push_str("=== co2 - Logistic Emissions Projection ===\n");
    out.push_str(&format!("Value: {value_label} ({UNIT})\n"));
    out.push_str(&format!(
        "Horizon: {} | samples={} | min points={} | max evals={}\n",
        config.horizon_year, config.sample_count, config.min_points, config.max_evaluations
    ));
    if !row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", row_errors.len()));
        for e in row_errors.iter().take(MAX_ROW_ERRORS_SHOWN) {
            out.push_str(&format!("  line {}: {}\n", e.line, e.message));
        }
        if row_errors.len() > MAX_ROW_ERRORS_SHOWN {
            out.push_str(&format!("  ... {} more\n", row_errors.len() - MAX_ROW_ERRORS_SHOWN));
        }
    }

    let checkpoints = checkpoint_years(config.horizon_year);
    for p in &run.projections {
        out.push('\n');
        out.push_str(&format_projection(p, &checkpoints));
    }

    let notes = format_messages(run);
    if !notes.is_empty() {
        out.push('\n');
        out.push_str(&notes);
    }

    out
}

fn format_projection(p: &Projection, checkpoints: &[i32]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}:\n", p.entity));
    out.push_str(&format!(
        "- L={:.6e} x0={:.3} k={:.6} b={:.6e}\n",
        p.params.l, p.params.x0, p.params.k, p.params.b
    ));
    out.push_str(&format!(
        "- fit: n={} SSE={:.4e} RMSE={} evals={}\n",
        p.quality.n,
        p.quality.sse,
        fmt_thousands(p.quality.rmse, 2),
        p.quality.evaluations
    ));
    out.push_str(&format!(
        "- plateau (L+b): {} {UNIT}\n",
        fmt_thousands(p.params.upper_asymptote(), 2)
    ));
    for &year in checkpoints {
        if let Some(v) = p.value_at(year) {
            out.push_str(&format!("- {year}: {} {UNIT}\n", fmt_thousands(v, 2)));
        }
    }
    out
}

/// Format fit warnings and informational notices.
pub fn format_messages(run: &ProjectionRun) -> String {
    let mut out = String::new();
    if !run.warnings.is_empty() {
        out.push_str("Warnings:\n");
        for w in &run.warnings {
            out.push_str(&format!("! {}\n", w.message()));
        }
    }
    if !run.notices.is_empty() {
        out.push_str("Notes:\n");
        for n in &run.notices {
            out.push_str(&format!("  {}\n", n.message));
        }
    }
    out
}

/// Format a sector breakdown table.
pub fn format_sector_breakdown(entity: &str, year: i32, shares: &[SectorShare]) -> String {
    let mut out = String::new();
    out.push_str(&format!("CO₂ emissions by sector: {entity}, {year}\n"));
    out.push_str(format!("{:<32} {:>22} {:>7}", "sector", "value (t)", "share").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<32} {:-<22} {:-<7}", "", "", "").trim_end());
    out.push('\n');

    if shares.is_empty() {
        out.push_str("(no positive sector values)\n");
        return out;
    }

    for s in shares {
        out.push_str(&format!(
            "{:<32} {:>22} {:>6.1}%\n",
            s.sector,
            fmt_thousands(s.value, 2),
            s.share * 100.0
        ));
    }
    out
}

/// Hover text for one airport marker.
pub fn airport_label(airport: &Airport) -> String {
    format!(
        "{}\n{}\nPassengers: {}",
        airport.name,
        airport.location,
        fmt_thousands(airport.passengers as f64, 0)
    )
}

/// Busiest-airports table: airport, country, location and total passengers.
pub fn format_airport_table(airports: &[Airport]) -> String {
    let mut out = String::new();
    out.push_str("Busiest airports, 2022\n");
    out.push_str(
        format!(
            "{:<48} {:<20} {:<28} {:>16}",
            "airport", "country", "location", "total passengers"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<48} {:-<20} {:-<28} {:-<16}", "", "", "", "").trim_end());
    out.push('\n');

    for a in airports {
        let line = format!(
            "{:<48} {:<20} {:<28} {:>16}",
            a.name,
            a.country,
            a.location,
            fmt_thousands(a.passengers as f64, 0)
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, FitWarning, LogisticParams, Notice, ProjectionPoint};

    #[test]
    fn thousands_separators() {
        assert_eq!(fmt_thousands(37_791_567_000.0, 2), "37,791,567,000.00");
        assert_eq!(fmt_thousands(0.0, 2), "0.00");
        assert_eq!(fmt_thousands(999.999, 2), "1,000.00");
        assert_eq!(fmt_thousands(-1234.5, 2), "-1,234.50");
        assert_eq!(fmt_thousands(-0.001, 2), "0.00");
        assert_eq!(fmt_thousands(123456.0, 0), "123,456");
    }

    fn atlanta() -> Airport {
        Airport {
            name: "Hartsfield-Jackson Atlanta International Airport".to_string(),
            country: "United States".to_string(),
            location: "Atlanta, Georgia".to_string(),
            passengers: 93_699_630,
            lat: Some(33.6407),
            lon: Some(-84.4277),
        }
    }

    #[test]
    fn airport_label_groups_passenger_thousands() {
        assert_eq!(
            airport_label(&atlanta()),
            "Hartsfield-Jackson Atlanta International Airport\nAtlanta, Georgia\nPassengers: 93,699,630"
        );
    }

    #[test]
    fn airport_table_rows() {
        let table = format_airport_table(&[atlanta()]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("airport"));
        assert!(lines[1].ends_with("total passengers"));
        assert!(lines[3].starts_with("Hartsfield-Jackson Atlanta International Airport"));
        assert!(lines[3].contains("United States"));
        assert!(lines[3].ends_with("      93,699,630"));
    }

    #[test]
    fn hover_label_layout() {
        assert_eq!(
            hover_label("World", 2050, 41_234_567.891),
            "Region: World\nYear: 2050\nEmissions: 41,234,567.89 Tonnes"
        );
    }

    #[test]
    fn compact_values() {
        assert_eq!(fmt_compact(37.8e9), "37.8G");
        assert_eq!(fmt_compact(950.0), "950.0");
        assert_eq!(fmt_compact(-2.5e6), "-2.5M");
    }

    #[test]
    fn summary_lists_projection_and_messages() {
        let run = ProjectionRun {
            projections: vec![Projection {
                entity: "World".to_string(),
                params: LogisticParams::new(100.0, 2035.0, 0.1, 5.0),
                quality: FitQuality {
                    sse: 0.0,
                    rmse: 0.0,
                    n: 10,
                    evaluations: 19,
                },
                points: vec![
                    ProjectionPoint { year: 2049, value: 85.0 },
                    ProjectionPoint { year: 2051, value: 88.0 },
                    ProjectionPoint { year: 2100, value: 104.8 },
                ],
            }],
            warnings: vec![FitWarning {
                entity: "Flat".to_string(),
                reason: "Singular matrix".to_string(),
            }],
            notices: vec![Notice {
                entity: "Short".to_string(),
                message: "Not enough data points for Short (3 < 6); skipping fit.".to_string(),
            }],
        };
        let text = format_run_summary(&run, "Annual CO₂ emissions", &ProjectionConfig::default(), &[]);

        assert!(text.contains("World:\n"));
        assert!(text.contains("- plateau (L+b): 105.00 Tonnes\n"));
        assert!(text.contains("- 2050: 88.00 Tonnes\n"));
        assert!(text.contains("- 2100: 104.80 Tonnes\n"));
        assert!(text.contains("! Could not fit logistic regression for Flat: Singular matrix\n"));
        assert!(text.contains("  Not enough data points for Short (3 < 6); skipping fit.\n"));
        assert!(!text.contains("Skipped rows"));
    }

    #[test]
    fn sector_table_shows_shares() {
        let shares = vec![
            SectorShare {
                sector: "Transport",
                value: 250.0,
                share: 0.25,
            },
            SectorShare {
                sector: "Electricity and heat",
                value: 750.0,
                share: 0.75,
            },
        ];
        let text = format_sector_breakdown("Germany", 2021, &shares);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "CO₂ emissions by sector: Germany, 2021");
        assert!(lines[3].starts_with("Transport"));
        assert!(lines[3].ends_with("250.00   25.0%"));
        assert!(lines[4].ends_with("75.0%"));
    }
}

//! Export projections to CSV.
//!
//! One row per projected point, with the entity's fitted parameters repeated on
//! every row so the file is easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::Projection;
use crate::error::AppError;

const HEADER: &str = "entity,year,value,L,x0,k,b";

/// Write projections to a CSV file.
pub fn write_projections_csv(path: &Path, projections: &[Projection]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_projections(file, projections)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;
    tracing::info!(path = %path.display(), entities = projections.len(), "wrote projection CSV");
    Ok(())
}

/// Write projections as CSV to any writer.
pub fn write_projections<W: Write>(out: W, projections: &[Projection]) -> std::io::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(HEADER.split(','))?;

    for p in projections {
        let params = [
            format!("{:.10e}", p.params.l),
            format!("{:.6}", p.params.x0),
            format!("{:.10}", p.params.k),
            format!("{:.10e}", p.params.b),
        ];
        for point in &p.points {
            let year = point.year.to_string();
            let value = format!("{:.4}", point.value);
            writer.write_record([
                p.entity.as_str(),
                year.as_str(),
                value.as_str(),
                params[0].as_str(),
                params[1].as_str(),
                params[2].as_str(),
                params[3].as_str(),
            ])?;
        }
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, LogisticParams, ProjectionPoint};

    fn projection(entity: &str) -> Projection {
        Projection {
            entity: entity.to_string(),
            params: LogisticParams::new(100.0, 2035.0, 0.1, 5.0),
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                n: 10,
                evaluations: 8,
            },
            points: vec![
                ProjectionPoint { year: 2035, value: 55.0 },
                ProjectionPoint { year: 2100, value: 104.85 },
            ],
        }
    }

    #[test]
    fn writes_one_row_per_point() {
        let mut buf = Vec::new();
        write_projections(&mut buf, &[projection("World"), projection("Asia, East")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "entity,year,value,L,x0,k,b");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("World,2035,55.0000,1.0000000000e2,2035.000000,0.1000000000,"));
        // Entity names containing commas are quoted.
        assert!(lines[3].starts_with("\"Asia, East\",2035,"));
    }
}

//! Read/write projection JSON files.
//!
//! A projection file is the portable output of a `project` run:
//! - the value column label and horizon year
//! - per entity: fitted parameters, fit quality and the projected points
//!
//! `co2 plot --projection FILE` re-renders it without refitting. The schema is
//! defined by `domain::ProjectionFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{Projection, ProjectionFile};
use crate::error::AppError;

/// Value of the `tool` field in files written by this crate.
pub const TOOL_NAME: &str = "co2-outlook";

/// Assemble the file contents for a finished run.
pub fn projection_file(value_label: &str, horizon_year: i32, projections: &[Projection]) -> ProjectionFile {
    ProjectionFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now(),
        value_label: value_label.to_string(),
        horizon_year,
        projections: projections.to_vec(),
    }
}

/// Write a projection JSON file.
pub fn write_projection_json(path: &Path, file: &ProjectionFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create projection JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write projection JSON: {e}")))?;

    tracing::info!(path = %path.display(), entities = file.projections.len(), "wrote projection JSON");
    Ok(())
}

/// Read a projection JSON file.
pub fn read_projection_json(path: &Path) -> Result<ProjectionFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open projection JSON '{}': {e}", path.display())))?;
    let parsed: ProjectionFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid projection JSON: {e}")))?;
    if parsed.projections.is_empty() {
        return Err(AppError::new(3, "Projection JSON contains no projections."));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, LogisticParams, ProjectionPoint};

    #[test]
    fn file_survives_disk() {
        let projection = Projection {
            entity: "World".to_string(),
            params: LogisticParams::new(3.9e10, 2003.0, 0.07, 1.0e9),
            quality: FitQuality {
                sse: 1.0,
                rmse: 0.5,
                n: 4,
                evaluations: 30,
            },
            points: vec![ProjectionPoint { year: 2050, value: 3.95e10 }],
        };
        let file = projection_file("Annual CO₂ emissions", 2100, &[projection]);
        assert_eq!(file.tool, "co2-outlook");

        let path = std::env::temp_dir().join(format!("co2-outlook-test-{}.json", std::process::id()));
        write_projection_json(&path, &file).unwrap();
        let back = read_projection_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.value_label, "Annual CO₂ emissions");
        assert_eq!(back.projections[0].params, file.projections[0].params);
        assert_eq!(back.projections[0].points, file.projections[0].points);
    }

    #[test]
    fn empty_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("co2-outlook-empty-{}.json", std::process::id()));
        let file = projection_file("x", 2100, &[]);
        write_projection_json(&path, &file).unwrap();
        let err = read_projection_json(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert_eq!(err.exit_code(), 3);
    }
}

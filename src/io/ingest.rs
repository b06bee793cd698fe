//! CSV ingest and normalization.
//!
//! This module turns the emissions CSV exports into in-memory tables:
//!
//! - annual tables: `Entity`, `Year` and one numeric value column
//! - the sector table: `Entity`, `Year` and the nine sector columns
//! - the busiest-airports table: `Airport`, `Country`, `Location`, `Total passengers`
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::data::{EmissionTable, SectorRecord, SectorTable};
use crate::domain::{Airport, EmissionRecord, SECTOR_COLUMNS};
use crate::error::AppError;

/// Columns that are never picked as the value column by auto-detection.
const KEY_COLUMNS: [&str; 3] = ["entity", "code", "year"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub entity: Option<String>,
    pub message: String,
}

/// Ingest output: the table plus bookkeeping about skipped rows.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: EmissionTable,
    /// Header of the value column as written in the file.
    pub value_column: String,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load an annual emissions CSV file.
///
/// `value_column` selects the numeric column by (case-insensitive) header name;
/// `None` picks the first column that isn't `Entity`, `Code` or `Year`.
pub fn load_emissions(path: &Path, value_column: Option<&str>) -> Result<IngestedTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_emissions(file, value_column)?;
    tracing::info!(
        path = %path.display(),
        rows = ingested.rows_used,
        skipped = ingested.row_errors.len(),
        column = %ingested.value_column,
        "loaded emissions table"
    );
    Ok(ingested)
}

/// Parse an annual emissions table from any reader.
pub fn read_emissions<R: Read>(reader: R, value_column: Option<&str>) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let entity_idx = require_column(&header_map, "entity")?;
    let year_idx = require_column(&header_map, "year")?;
    let value_idx = resolve_value_column(&headers, &header_map, value_column)?;
    let value_name = clean_header(&headers[value_idx]).to_string();

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    entity: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, entity_idx, year_idx, value_idx, &value_name) {
            Ok(row) => records.push(row),
            Err(message) => row_errors.push(RowError {
                line,
                entity: get_field(&record, entity_idx).map(str::to_string),
                message,
            }),
        }
    }

    let rows_used = records.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows remain after parsing."));
    }

    Ok(IngestedTable {
        table: EmissionTable::new(value_name.clone(), records),
        value_column: value_name,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Load the emissions-by-sector CSV file.
pub fn load_sectors(path: &Path) -> Result<SectorTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = read_sectors(file)?;
    tracing::info!(path = %path.display(), rows = table.records.len(), "loaded sector table");
    Ok(table)
}

/// Parse a sector table from any reader.
///
/// Rows with an unparsable entity/year are skipped; empty or non-numeric sector
/// cells become `None`.
pub fn read_sectors<R: Read>(reader: R) -> Result<SectorTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let entity_idx = require_column(&header_map, "entity")?;
    let year_idx = require_column(&header_map, "year")?;

    let sector_idx: Vec<Option<usize>> = SECTOR_COLUMNS
        .iter()
        .map(|name| header_map.get(&normalize_header_name(name)).copied())
        .collect();
    let mut present = [false; SECTOR_COLUMNS.len()];
    for (slot, idx) in present.iter_mut().zip(&sector_idx) {
        *slot = idx.is_some();
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let Ok(record) = result else { continue };
        let Some(entity) = get_field(&record, entity_idx) else { continue };
        let Some(year) = get_field(&record, year_idx).and_then(parse_year) else { continue };

        let mut values = [None; SECTOR_COLUMNS.len()];
        for (slot, idx) in values.iter_mut().zip(&sector_idx) {
            *slot = idx.and_then(|i| parse_opt_f64(get_field(&record, i)));
        }

        records.push(SectorRecord {
            entity: entity.to_string(),
            year,
            values,
        });
    }

    Ok(SectorTable { records, present })
}

/// Load the busiest-airports CSV file.
pub fn load_airports(path: &Path) -> Result<(Vec<Airport>, Vec<RowError>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let (airports, row_errors) = read_airports(file)?;
    tracing::info!(
        path = %path.display(),
        rows = airports.len(),
        skipped = row_errors.len(),
        "loaded airports table"
    );
    Ok((airports, row_errors))
}

/// Parse the airports table from any reader, keeping file order.
///
/// `lat`/`long` are optional; rows without a name or a valid passenger count
/// are skipped and reported.
pub fn read_airports<R: Read>(reader: R) -> Result<(Vec<Airport>, Vec<RowError>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let name_idx = require_column(&header_map, "airport")?;
    let country_idx = require_column(&header_map, "country")?;
    let location_idx = require_column(&header_map, "location")?;
    let passengers_idx = header_map
        .get("total passengers")
        .copied()
        .ok_or_else(|| AppError::new(2, "Missing required column: `Total passengers`"))?;
    let lat_idx = header_map.get("lat").copied();
    let lon_idx = header_map.get("long").copied();

    let mut airports = Vec::new();
    let mut row_errors = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    entity: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let Some(name) = get_field(&record, name_idx) else {
            row_errors.push(RowError {
                line,
                entity: None,
                message: "Missing required value: `Airport`".to_string(),
            });
            continue;
        };
        let Some(passengers) = get_field(&record, passengers_idx).and_then(parse_count) else {
            row_errors.push(RowError {
                line,
                entity: Some(name.to_string()),
                message: "Missing/invalid `Total passengers` value.".to_string(),
            });
            continue;
        };

        airports.push(Airport {
            name: name.to_string(),
            country: get_field(&record, country_idx).unwrap_or_default().to_string(),
            location: get_field(&record, location_idx).unwrap_or_default().to_string(),
            passengers,
            lat: lat_idx.and_then(|i| parse_opt_f64(get_field(&record, i))),
            lon: lon_idx.and_then(|i| parse_opt_f64(get_field(&record, i))),
        });
    }

    if airports.is_empty() {
        return Err(AppError::new(3, "No valid rows remain after parsing."));
    }
    Ok((airports, row_errors))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn clean_header(name: &str) -> &str {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, `Entity` won't be found.
    name.trim().trim_start_matches('\u{feff}').trim()
}

fn normalize_header_name(name: &str) -> String {
    clean_header(name).to_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{}`", capitalize(name))))
}

fn resolve_value_column(
    headers: &StringRecord,
    header_map: &HashMap<String, usize>,
    requested: Option<&str>,
) -> Result<usize, AppError> {
    if let Some(name) = requested {
        return header_map
            .get(&normalize_header_name(name))
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Missing value column: `{name}`")));
    }

    headers
        .iter()
        .position(|h| !KEY_COLUMNS.contains(&normalize_header_name(h).as_str()))
        .ok_or_else(|| {
            AppError::new(
                2,
                "Could not find a value column: the CSV only has `Entity`, `Code` and `Year`.",
            )
        })
}

fn parse_row(
    record: &StringRecord,
    entity_idx: usize,
    year_idx: usize,
    value_idx: usize,
    value_name: &str,
) -> Result<EmissionRecord, String> {
    let entity = get_field(record, entity_idx).ok_or("Missing required value: `Entity`")?;
    let year_raw = get_field(record, year_idx).ok_or("Missing required value: `Year`")?;
    let year = parse_year(year_raw).ok_or_else(|| format!("Invalid year '{year_raw}'."))?;
    let value = parse_opt_f64(get_field(record, value_idx))
        .ok_or_else(|| format!("Missing/invalid `{value_name}` value."))?;

    Ok(EmissionRecord {
        entity: entity.to_string(),
        year,
        value,
    })
}

fn get_field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_year(s: &str) -> Option<i32> {
    s.parse::<i32>().ok().or_else(|| {
        // Some exports write years as floats (`2021.0`).
        let v = s.parse::<f64>().ok()?;
        (v.is_finite() && v.fract() == 0.0).then_some(v as i32)
    })
}

/// Non-negative whole count; accepts `1,234,567` and `1234567.0`.
fn parse_count(s: &str) -> Option<u64> {
    let cleaned = s.replace([',', '_'], "");
    cleaned.parse::<u64>().ok().or_else(|| {
        let v = cleaned.parse::<f64>().ok()?;
        (v.is_finite() && v >= 0.0 && v.fract() == 0.0).then_some(v as u64)
    })
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.replace('_', "").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EmissionSource;

    const ANNUAL: &str = "\u{feff}Entity,Code,Year,Annual CO₂ emissions\n\
        World,OWID_WRL,2021,36400000000\n\
        World,OWID_WRL,2022,37100000000\n\
        Europe,,2021,\n\
        Europe,,abc,5000000000\n\
        Europe,,2022,5100000000.0\n";

    #[test]
    fn auto_detects_value_column_and_skips_bad_rows() {
        let ingested = read_emissions(ANNUAL.as_bytes(), None).unwrap();
        assert_eq!(ingested.value_column, "Annual CO₂ emissions");
        assert_eq!(ingested.rows_read, 5);
        assert_eq!(ingested.rows_used, 3);

        let lines: Vec<usize> = ingested.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![4, 5]);
        assert_eq!(ingested.row_errors[1].message, "Invalid year 'abc'.");
        assert_eq!(ingested.row_errors[0].entity.as_deref(), Some("Europe"));

        let world = ingested.table.series("World").unwrap();
        assert_eq!(world.values(), vec![36.4e9, 37.1e9]);
        assert_eq!(ingested.table.value_label(), "Annual CO₂ emissions");
    }

    #[test]
    fn explicit_value_column_is_case_insensitive() {
        let csv = "Entity,Year,Total annual CO₂ emissions from aviation,Other\nWorld,2019,1.0,2.0\n";
        let ingested = read_emissions(csv.as_bytes(), Some("total annual co₂ emissions from aviation")).unwrap();
        assert_eq!(ingested.table.series("World").unwrap().values(), vec![1.0]);

        let err = read_emissions(csv.as_bytes(), Some("missing")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_entity_column_is_a_schema_error() {
        let err = read_emissions("Country,Year,Value\nX,2000,1\n".as_bytes(), None).unwrap_err();
        assert_eq!(err.message(), "Missing required column: `Entity`");
    }

    #[test]
    fn all_rows_invalid_is_an_error() {
        let err = read_emissions("Entity,Year,Value\nX,2000,\n".as_bytes(), None).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn sector_headers_are_trimmed() {
        let csv = "Entity,Code,Year, Buildings ,Industry,Transport\n\
            Germany,DEU,2021,10,30,\n\
            Germany,DEU,x,1,1,1\n";
        let table = read_sectors(csv.as_bytes()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert!(table.present[0] && table.present[1] && table.present[4]);
        assert!(!table.present[8]);
        assert_eq!(table.records[0].values[0], Some(10.0));
        assert_eq!(table.records[0].values[4], None);
    }

    #[test]
    fn airports_keep_file_order_and_skip_bad_counts() {
        let csv = "Airport,Country,Location,Total passengers,lat,long\n\
            Hartsfield–Jackson Atlanta International Airport,United States,\"Atlanta, Georgia\",93699630,33.6407,-84.4277\n\
            Dallas Fort Worth International Airport,United States,\"Dallas, Texas\",\"73,362,946\",,\n\
            Nowhere,X,Y,n/a,0,0\n";
        let (airports, errors) = read_airports(csv.as_bytes()).unwrap();
        assert_eq!(airports.len(), 2);
        assert_eq!(airports[0].location, "Atlanta, Georgia");
        assert_eq!(airports[0].passengers, 93_699_630);
        assert_eq!(airports[0].lat, Some(33.6407));
        assert_eq!(airports[1].passengers, 73_362_946);
        assert_eq!(airports[1].lon, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 4);
        assert_eq!(errors[0].entity.as_deref(), Some("Nowhere"));
    }

    #[test]
    fn airports_require_passenger_column() {
        let err = read_airports("Airport,Country,Location\nA,B,C\n".as_bytes()).unwrap_err();
        assert_eq!(err.message(), "Missing required column: `Total passengers`");
    }

    #[test]
    fn float_years_are_accepted() {
        assert_eq!(parse_year("2021.0"), Some(2021));
        assert_eq!(parse_year("2021.5"), None);
    }
}

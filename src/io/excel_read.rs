use std::collections::HashMap;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::io::excel_write::MASTER_HEADER;
use crate::model::{RateRecord, Region};
use crate::schedule::normalize_time;

/// Column names a raw rate drop must carry, header row first.
pub const SOURCE_COLUMNS: [&str; 9] = [
    "abrangencia",
    "mnemonico",
    "nome_programa",
    "dias_exibicao",
    "horario_inicial",
    "genero",
    "preco_30s",
    "preco_15s",
    "preco_10s",
];

/// Reads rate records from a raw source file. The first sheet is the data
/// sheet; columns are located by header name. Rows with region codes
/// outside the known set are dropped unless `strict_regions` is on.
pub fn read_rate_records(path: &Path, settings: &Settings) -> Result<Vec<RateRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PipelineError::Workbook(format!("no sheets in {}", path.display())))?;
    let range = read_required_sheet(&mut workbook, path, &sheet_name)?;

    let columns = header_columns(&range, 0);
    if settings.strict_columns {
        for required in SOURCE_COLUMNS {
            if !columns.contains_key(required) {
                return Err(PipelineError::MissingColumn {
                    file: path.to_path_buf(),
                    column: required.to_string(),
                });
            }
        }
    }
    let field = |row: &[DataType], name: &str| {
        columns
            .get(name)
            .and_then(|index| row.get(*index))
            .map(|cell| cell_to_string(Some(cell)))
            .unwrap_or_default()
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in range.rows().skip(1) {
        let code = field(row, "mnemonico").trim().to_uppercase();
        let name = field(row, "nome_programa").trim().to_string();
        if code.is_empty() && name.is_empty() {
            continue;
        }
        let region_code = field(row, "abrangencia");
        let Some(region) = Region::from_code(&region_code) else {
            if settings.strict_regions {
                return Err(PipelineError::UnknownRegion(region_code.trim().to_string()));
            }
            dropped += 1;
            debug!(code = %region_code.trim(), program = %code, "dropping row with unknown region");
            continue;
        };
        records.push(RateRecord {
            program_code: code,
            program_name: name,
            day_spec: field(row, "dias_exibicao").trim().to_string(),
            time: cell_time(columns.get("horario_inicial").and_then(|i| row.get(*i))),
            region,
            genre: field(row, "genero").trim().to_string(),
            price_30s: cell_to_number(columns.get("preco_30s").and_then(|i| row.get(*i))),
            price_15s: cell_to_number(columns.get("preco_15s").and_then(|i| row.get(*i))),
            price_10s: cell_to_number(columns.get("preco_10s").and_then(|i| row.get(*i))),
        });
    }
    if dropped > 0 {
        warn!(count = dropped, file = %path.display(), "rows with unknown regions were dropped");
    }
    Ok(records)
}

/// Names of all sheets in a workbook, in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook: Xlsx<_> = open_workbook(path)?;
    Ok(workbook.sheet_names().to_vec())
}

/// Reads records back from a consolidated master sheet. The header sits at
/// the second row; columns are located by name so stray layout edits to the
/// template sheet do not shift the schema silently.
pub fn read_master_records(path: &Path, sheet: &str) -> Result<Vec<RateRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, path, sheet)?;

    let columns = header_columns(&range, 1);
    for required in MASTER_HEADER {
        if !columns.contains_key(&required.to_lowercase()) {
            return Err(PipelineError::MissingColumn {
                file: path.to_path_buf(),
                column: required.to_string(),
            });
        }
    }
    let field = |row: &[DataType], name: &str| {
        columns
            .get(name)
            .and_then(|index| row.get(*index))
            .map(|cell| cell_to_string(Some(cell)))
            .unwrap_or_default()
    };

    let mut records = Vec::new();
    for row in range.rows().skip(2) {
        let code = field(row, "prog").trim().to_string();
        if code.is_empty() {
            continue;
        }
        let Some(region) = Region::from_code(&field(row, "region")) else {
            continue;
        };
        records.push(RateRecord {
            program_code: code,
            program_name: field(row, "name").trim().to_string(),
            day_spec: field(row, "day").trim().to_string(),
            time: normalize_time(&field(row, "time")),
            region,
            genre: field(row, "genre").trim().to_string(),
            price_30s: cell_to_number(columns.get("price_30").and_then(|i| row.get(*i))),
            price_15s: cell_to_number(columns.get("price_15").and_then(|i| row.get(*i))),
            price_10s: cell_to_number(columns.get("price_10").and_then(|i| row.get(*i))),
        });
    }
    Ok(records)
}

fn read_required_sheet(
    workbook: &mut Xlsx<std::io::BufReader<std::fs::File>>,
    path: &Path,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| PipelineError::MissingSheet {
            workbook: path.to_path_buf(),
            sheet: name.to_string(),
        })?;
    let range = range_result.map_err(PipelineError::from)?;
    Ok(range)
}

/// Lower-cased header name → column index, taken from the given row.
fn header_columns(range: &calamine::Range<DataType>, header_row: usize) -> HashMap<String, usize> {
    range
        .rows()
        .nth(header_row)
        .map(|row| {
            row.iter()
                .enumerate()
                .filter_map(|(index, cell)| {
                    let name = cell_to_string(Some(cell)).trim().to_lowercase();
                    (!name.is_empty()).then_some((name, index))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn cell_to_number(cell: Option<&DataType>) -> Option<f64> {
    match cell {
        Some(DataType::Float(value)) => Some(*value),
        Some(DataType::Int(value)) => Some(*value as f64),
        Some(DataType::String(value)) => value.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Times arrive either as text or as an Excel serial fraction of a day.
fn cell_time(cell: Option<&DataType>) -> Option<String> {
    match cell {
        Some(DataType::DateTime(serial)) => {
            let minutes = ((serial.fract() * 1440.0).round() as u32) % 1440;
            Some(format!("{:02}:{:02}", minutes / 60, minutes % 60))
        }
        other => normalize_time(&cell_to_string(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_times_convert_to_hh_mm() {
        assert_eq!(cell_time(Some(&DataType::DateTime(0.5))), Some("12:00".into()));
        let slot = 20.5 / 24.0;
        assert_eq!(
            cell_time(Some(&DataType::DateTime(45000.0 + slot))),
            Some("20:30".into())
        );
    }

    #[test]
    fn text_times_fall_back_to_the_normalizer() {
        assert_eq!(
            cell_time(Some(&DataType::String("08:00:00".into()))),
            Some("08:00".into())
        );
        assert_eq!(cell_time(Some(&DataType::String("25:70".into()))), None);
        assert_eq!(cell_time(None), None);
    }

    #[test]
    fn numeric_cells_parse_with_comma_decimals() {
        assert_eq!(cell_to_number(Some(&DataType::Float(120.5))), Some(120.5));
        assert_eq!(cell_to_number(Some(&DataType::Int(80))), Some(80.0));
        assert_eq!(
            cell_to_number(Some(&DataType::String("1234,56".into()))),
            Some(1234.56)
        );
        assert_eq!(cell_to_number(Some(&DataType::Empty)), None);
        assert_eq!(cell_to_number(Some(&DataType::String("n/a".into()))), None);
    }
}

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use umya_spreadsheet::{Spreadsheet, Worksheet, reader, writer};

use crate::error::{PipelineError, Result};
use crate::model::RateRecord;

/// Header written to every consolidated master sheet.
pub const MASTER_HEADER: [&str; 9] = [
    "PROG", "NAME", "DAY", "TIME", "REGION", "GENRE", "PRICE_30", "PRICE_15", "PRICE_10",
];

/// Row carrying [`MASTER_HEADER`]; data rows follow immediately below.
pub const MASTER_HEADER_ROW: u32 = 2;

/// Loads a styled workbook for in-place mutation.
pub fn open_workbook(path: &Path) -> Result<Spreadsheet> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    reader::xlsx::read(path)
        .map_err(|error| PipelineError::Workbook(format!("failed to open {}: {error}", path.display())))
}

/// Saves a workbook, distinguishing a locked destination (the operator has
/// the file open elsewhere) from other write failures.
pub fn save_workbook(book: &Spreadsheet, path: &Path) -> Result<()> {
    if path.exists() {
        OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|error| match error.kind() {
                ErrorKind::PermissionDenied => PipelineError::SaveConflict(path.to_path_buf()),
                _ => PipelineError::Io(error),
            })?;
    }
    writer::xlsx::write(book, path)
        .map_err(|error| PipelineError::Workbook(format!("failed to save {}: {error}", path.display())))
}

/// Duplicates the named template sheet under a new name, styles included.
pub fn duplicate_sheet(
    book: &mut Spreadsheet,
    workbook_path: &Path,
    template: &str,
    target: &str,
) -> Result<()> {
    let sheet = book
        .get_sheet_by_name(template)
        .ok_or_else(|| PipelineError::MissingSheet {
            workbook: workbook_path.to_path_buf(),
            sheet: template.to_string(),
        })?;
    let mut copy = sheet.clone();
    copy.set_name(target);
    book.add_sheet(copy)
        .map_err(|error| PipelineError::Workbook(format!("cannot add sheet '{target}': {error}")))?;
    Ok(())
}

/// Wipes the data area of a freshly duplicated sheet and writes the
/// consolidated header and rows. The DAY column keeps the raw day spec;
/// canonical labels are derived again at publish time.
pub fn write_master_sheet(sheet: &mut Worksheet, records: &[RateRecord], clear_rows: u32) {
    for row in MASTER_HEADER_ROW..=clear_rows {
        for col in 1..=(MASTER_HEADER.len() as u32 + 1) {
            sheet.get_cell_mut((col, row)).set_value("");
        }
    }

    for (index, title) in MASTER_HEADER.iter().enumerate() {
        sheet
            .get_cell_mut((index as u32 + 1, MASTER_HEADER_ROW))
            .set_value(*title);
    }

    for (offset, record) in records.iter().enumerate() {
        let row = MASTER_HEADER_ROW + 1 + offset as u32;
        let texts = [
            record.program_code.as_str(),
            record.program_name.as_str(),
            record.day_spec.as_str(),
            record.time_label(),
            record.region.code(),
            record.genre.as_str(),
        ];
        for (index, value) in texts.iter().enumerate() {
            sheet.get_cell_mut((index as u32 + 1, row)).set_value(*value);
        }
        let prices = [record.price_30s, record.price_15s, record.price_10s];
        for (index, price) in prices.iter().enumerate() {
            if let Some(price) = price {
                sheet
                    .get_cell_mut((index as u32 + 7, row))
                    .set_value(price.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Region;
    use umya_spreadsheet::new_file;

    fn record(code: &str) -> RateRecord {
        RateRecord {
            program_code: code.to_string(),
            program_name: format!("{code} show"),
            day_spec: "SEG-SEX".to_string(),
            time: Some("20:30".to_string()),
            region: Region::Statewide,
            genre: "news".to_string(),
            price_30s: Some(100.0),
            price_15s: None,
            price_10s: Some(35.5),
        }
    }

    #[test]
    fn master_sheet_layout() {
        let mut book = new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut("A5").set_value("stale data");
        write_master_sheet(sheet, &[record("JN")], 50);

        assert_eq!(sheet.get_value("A2"), "PROG");
        assert_eq!(sheet.get_value("I2"), "PRICE_10");
        assert_eq!(sheet.get_value("A3"), "JN");
        assert_eq!(sheet.get_value("D3"), "20:30");
        assert_eq!(sheet.get_value("E3"), "MAE");
        assert_eq!(sheet.get_value("G3"), "100");
        assert_eq!(sheet.get_value("H3"), "");
        assert_eq!(sheet.get_value("I3"), "35.5");
        assert_eq!(sheet.get_value("A5"), "");
    }

    #[test]
    fn duplicate_sheet_preserves_the_template() {
        let mut book = new_file();
        book.get_sheet_by_name_mut("Sheet1").unwrap().set_name("TABLE");
        book.get_sheet_by_name_mut("TABLE")
            .unwrap()
            .get_cell_mut("A1")
            .set_value("RATE TABLE");
        duplicate_sheet(&mut book, Path::new("master.xlsx"), "TABLE", "TABLE_MARCH_2025")
            .unwrap();
        assert_eq!(
            book.get_sheet_by_name("TABLE_MARCH_2025")
                .unwrap()
                .get_value("A1"),
            "RATE TABLE"
        );
        assert!(book.get_sheet_by_name("TABLE").is_some());
    }

    #[test]
    fn duplicating_a_missing_template_fails() {
        let mut book = new_file();
        let result = duplicate_sheet(&mut book, Path::new("master.xlsx"), "TABLE", "X");
        assert!(matches!(result, Err(PipelineError::MissingSheet { .. })));
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use ratecard_tools::config::Settings;
use ratecard_tools::io::{excel_read, excel_write};
use ratecard_tools::model::{RateRecord, Region};
use ratecard_tools::pipeline;
use tempfile::tempdir;
use umya_spreadsheet::{new_file, writer};

const MASTER_FILE: &str = "Rate Card Master.xlsx";
const TEMPLATE_FILE: &str = "Price List Template.xlsx";

const SOURCE_HEADER: [&str; 9] = [
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

fn write_source(path: &Path, rows: &[[&str; 9]]) {
    let mut book = new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").expect("default sheet");
    for (col, title) in SOURCE_HEADER.iter().enumerate() {
        sheet.get_cell_mut((col as u32 + 1, 1)).set_value(*title);
    }
    for (index, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet
                    .get_cell_mut((col as u32 + 1, index as u32 + 2))
                    .set_value(*value);
            }
        }
    }
    writer::xlsx::write(&book, path).expect("source written");
}

fn write_master(path: &Path) {
    let mut book = new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").expect("default sheet");
    sheet.set_name("TABLE");
    sheet.get_cell_mut("A1").set_value("CONSOLIDATED RATE TABLE");
    writer::xlsx::write(&book, path).expect("master written");
}

fn write_template(path: &Path, with_sunday: bool) {
    let mut book = new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").expect("default sheet");
    sheet.set_name("PRICES 30S");
    sheet.get_cell_mut("A1").set_value("NETWORK PRICE LIST");
    sheet.add_merge_cells("A1:H1");
    sheet.get_cell_mut("A7").set_value("PRIME AND DAYTIME PROGRAMMING");
    sheet.get_cell_mut("A20").set_value("SATURDAY PROGRAMMING");
    if with_sunday {
        sheet.get_cell_mut("A30").set_value("SUNDAY PROGRAMMING");
    }
    sheet
        .get_cell_mut("A55")
        .set_value("VALID PRICE LIST FOR PURCHASES MADE IN JANUARY 2024");
    sheet.get_cell_mut("A56").set_value("UPDATED ON 01/01/2024");
    writer::xlsx::write(&book, path).expect("template written");
}

fn cell(range: &calamine::Range<DataType>, row: u32, col: u32) -> String {
    range
        .get_value((row - 1, col - 1))
        .map(|value| value.to_string())
        .unwrap_or_default()
}

fn sheet_range(path: &Path, sheet: &str) -> calamine::Range<DataType> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opens");
    workbook
        .worksheet_range(sheet)
        .expect("sheet present")
        .expect("sheet readable")
}

fn region_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("region dir exists")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}

#[test]
fn full_run_consolidates_and_publishes_per_region() {
    let temp = tempdir().expect("temporary directory");
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(&input).expect("input dir");

    write_master(&input.join(MASTER_FILE));
    write_template(&input.join(TEMPLATE_FILE), true);
    write_source(
        &input.join("Network Rates_2025_03.xlsx"),
        &[
            ["MAE", "JN", "Evening News", "SEG/TER/QUA/QUI/SEX", "20:30", "news", "100", "60", "40"],
            ["MAE", "JN", "Evening News", "SEG/TER/QUA/QUI/SEX", "20:30", "news", "100", "60", "40"],
            ["MAI", "JN", "Evening News", "SEG/TER/QUA/QUI/SEX", "20:30", "news", "80", "48", "32"],
            ["ZZZ", "XX", "Ghost Show", "SEG", "10:00", "variety", "10", "", ""],
            ["MAE", "SS", "Saturday Special", "SAB", "12:00", "variety", "50", "", ""],
            ["MAE", "LN", "Late Night Talk", "sex/seg/ter/qua/qui", "01:00", "talk", "30", "20", "10"],
        ],
    );

    let settings = Settings::default();
    let saved = pipeline::ingest(&input, &output, MASTER_FILE, &settings)
        .expect("ingest succeeds")
        .expect("a master was saved");
    assert_eq!(
        saved,
        output.join("master").join("2025").join("Rate Card Master - March 2025.xlsx")
    );

    // The consolidated sheet keeps duplicates and drops the unknown region,
    // sorted by (day order, shifted time, program code).
    let master = sheet_range(&saved, "TABLE_MARCH_2025");
    assert_eq!(cell(&master, 2, 1), "PROG");
    let programs: Vec<String> = (3..=8).map(|row| cell(&master, row, 1)).collect();
    assert_eq!(programs, ["JN", "JN", "JN", "LN", "SS", ""]);
    assert_eq!(cell(&master, 3, 4), "20:30");
    assert_eq!(cell(&master, 6, 4), "01:00");
    assert_eq!(cell(&master, 7, 5), "MAE");

    let today = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
    pipeline::publish(&saved, &input.join(TEMPLATE_FILE), &output, &settings, today)
        .expect("publish succeeds");

    let region_dir = output.join("regions").join("2025").join("MARCH");
    let files = region_files(&region_dir);
    assert_eq!(
        files,
        vec![
            region_dir.join("MAE - Price List - March 2025.xlsx"),
            region_dir.join("MAI - Price List - March 2025.xlsx"),
        ]
    );

    // Statewide report: dedup collapsed the repeated JN row, the late-night
    // slot sorts after prime time, Saturday goes to its own block.
    let report = sheet_range(&files[0], "PRICES 30S");
    assert_eq!(cell(&report, 2, 1), "PRICE LIST MARCH 2025");
    assert_eq!(cell(&report, 3, 1), "STATEWIDE (MAE)");
    assert_eq!(cell(&report, 9, 1), "MON-FRI");
    assert_eq!(cell(&report, 9, 2), "20:30");
    assert_eq!(cell(&report, 9, 3), "JN");
    assert_eq!(cell(&report, 9, 6), "100");
    assert_eq!(cell(&report, 10, 3), "LN");
    assert_eq!(cell(&report, 11, 3), "");
    assert_eq!(cell(&report, 22, 1), "SAT");
    assert_eq!(cell(&report, 22, 3), "SS");
    assert_eq!(
        cell(&report, 55, 1),
        "VALID PRICE LIST FOR PURCHASES MADE IN MARCH 2025"
    );
    assert_eq!(cell(&report, 56, 1), "UPDATED ON 14/03/2025");

    // The interior report carries its own price for the shared programme.
    let interior = sheet_range(&files[1], "PRICES 30S");
    assert_eq!(cell(&interior, 3, 1), "INTERIOR (MAI)");
    assert_eq!(cell(&interior, 9, 3), "JN");
    assert_eq!(cell(&interior, 9, 6), "80");

    // Rerunning publish never overwrites an existing report.
    let canary = b"left alone";
    fs::write(&files[0], canary).expect("canary written");
    pipeline::publish(&saved, &input.join(TEMPLATE_FILE), &output, &settings, today)
        .expect("second publish succeeds");
    assert_eq!(fs::read(&files[0]).expect("canary read"), canary);
    assert_eq!(region_files(&region_dir).len(), 2);
}

#[test]
fn existing_consolidated_sheets_are_not_rebuilt() {
    let temp = tempdir().expect("temporary directory");
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(&input).expect("input dir");

    let master_path = input.join(MASTER_FILE);
    let mut book = new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").expect("default sheet");
    sheet.set_name("TABLE");
    let target = book.new_sheet("TABLE_MARCH_2025").expect("sheet added");
    target.get_cell_mut("A3").set_value("ALREADY CONSOLIDATED");
    writer::xlsx::write(&book, &master_path).expect("master written");

    write_source(
        &input.join("Network Rates_2025_03.xlsx"),
        &[["MAE", "JN", "Evening News", "SEG", "20:30", "news", "100", "60", "40"]],
    );

    let settings = Settings::default();
    let saved = pipeline::ingest(&input, &output, MASTER_FILE, &settings)
        .expect("ingest succeeds")
        .expect("a master was saved");

    let master = sheet_range(&saved, "TABLE_MARCH_2025");
    assert_eq!(cell(&master, 3, 1), "ALREADY CONSOLIDATED");
}

#[test]
fn a_source_missing_a_required_column_is_rejected_alone() {
    let temp = tempdir().expect("temporary directory");
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(&input).expect("input dir");
    write_master(&input.join(MASTER_FILE));

    // Header lacks preco_15s entirely.
    let path = input.join("Network Rates_2025_04.xlsx");
    let mut book = new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").expect("default sheet");
    for (col, title) in ["abrangencia", "mnemonico", "nome_programa"].iter().enumerate() {
        sheet.get_cell_mut((col as u32 + 1, 1)).set_value(*title);
    }
    writer::xlsx::write(&book, &path).expect("source written");

    write_source(
        &input.join("Network Rates_2025_03.xlsx"),
        &[["MAE", "JN", "Evening News", "SEG", "20:30", "news", "100", "60", "40"]],
    );

    let settings = Settings::default();
    let saved = pipeline::ingest(&input, &output, MASTER_FILE, &settings)
        .expect("ingest succeeds despite the bad file")
        .expect("a master was saved");

    // The good March file landed; April did not, but still names the save.
    assert!(saved.ends_with("Rate Card Master - April 2025.xlsx"));
    let workbook: Xlsx<_> = open_workbook(&saved).expect("workbook opens");
    let names = workbook.sheet_names().to_vec();
    assert!(names.contains(&"TABLE_MARCH_2025".to_string()));
    assert!(!names.iter().any(|name| name.contains("APRIL")));
}

#[test]
fn records_missing_a_template_section_are_skipped_silently() {
    let temp = tempdir().expect("temporary directory");
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir_all(&input).expect("input dir");

    write_master(&input.join(MASTER_FILE));
    write_template(&input.join(TEMPLATE_FILE), false);
    write_source(
        &input.join("Network Rates_2025_03.xlsx"),
        &[
            ["MAE", "JN", "Evening News", "SEG", "20:30", "news", "100", "60", "40"],
            ["MAE", "SM", "Sunday Matinee", "DOM", "14:00", "film", "70", "", ""],
        ],
    );

    let settings = Settings::default();
    let today = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
    pipeline::run(&input, &output, MASTER_FILE, TEMPLATE_FILE, &settings, today)
        .expect("run succeeds");

    let report = output
        .join("regions")
        .join("2025")
        .join("MARCH")
        .join("MAE - Price List - March 2025.xlsx");
    let range = sheet_range(&report, "PRICES 30S");
    assert_eq!(cell(&range, 9, 3), "JN");
    // No Sunday section exists, so the Sunday programme appears nowhere.
    for row in 1..=60 {
        for col in 1..=8 {
            assert_ne!(cell(&range, row, col), "SM");
        }
    }
}

#[test]
fn master_sheet_round_trips_the_record_set() {
    let temp = tempdir().expect("temporary directory");
    let path = temp.path().join("master.xlsx");

    let records = vec![
        RateRecord {
            program_code: "JN".to_string(),
            program_name: "Evening News".to_string(),
            day_spec: "SEG/TER/QUA/QUI/SEX".to_string(),
            time: Some("20:30".to_string()),
            region: Region::Statewide,
            genre: "news".to_string(),
            price_30s: Some(100.0),
            price_15s: Some(60.5),
            price_10s: None,
        },
        RateRecord {
            program_code: "SS".to_string(),
            program_name: "Saturday Special".to_string(),
            day_spec: "SAB".to_string(),
            time: None,
            region: Region::Balsas,
            genre: String::new(),
            price_30s: Some(0.0),
            price_15s: None,
            price_10s: None,
        },
    ];

    let mut book = new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").expect("default sheet");
    sheet.set_name("TABLE_MAY_2025");
    excel_write::write_master_sheet(sheet, &records, 50);
    excel_write::save_workbook(&book, &path).expect("master saved");

    let restored = excel_read::read_master_records(&path, "TABLE_MAY_2025")
        .expect("master read back");
    assert_eq!(restored, records);
}

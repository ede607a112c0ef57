//! The two batch stages, wired together.
//!
//! `ingest` folds raw monthly rate drops into the master workbook, one
//! consolidated sheet per (month, year). `publish` re-reads those sheets and
//! emits one styled price-list report per region. Failures are isolated per
//! unit of work: a bad source file, a malformed sheet, or a locked output
//! file is logged and the rest of the run continues.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, error, info, instrument};

use crate::config::Settings;
use crate::consolidate::consolidate;
use crate::error::{PipelineError, Result};
use crate::io::{excel_read, excel_write};
use crate::model::{DayGroup, RateRecord, Region};
use crate::ordering::{day_group, sort_records};
use crate::template::{self, AnchorSource, MarkerScan};

/// Consolidates every stamped source file in `input_dir` into the master
/// workbook and saves the result under `output_dir`, named after the most
/// recent period seen. Returns the saved path, or `None` when there was
/// nothing to ingest.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input_dir.display(), output = %output_dir.display())
)]
pub fn ingest(
    input_dir: &Path,
    output_dir: &Path,
    master_file: &str,
    settings: &Settings,
) -> Result<Option<PathBuf>> {
    let master_path = input_dir.join(master_file);
    let mut book = excel_write::open_workbook(&master_path)?;
    if book
        .get_sheet_by_name(&settings.master_template_sheet)
        .is_none()
    {
        return Err(PipelineError::MissingSheet {
            workbook: master_path,
            sheet: settings.master_template_sheet.clone(),
        });
    }

    let mut latest: Option<(i32, u32)> = None;
    let mut added = 0usize;
    for path in source_files(input_dir, master_file)? {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let Some((year, month)) = period_stamp(&file_name) else {
            error!(file = %file_name, "source file name has no year/month stamp; skipping");
            continue;
        };
        let Some(month_label) = month_name(month) else {
            error!(file = %file_name, month, "source file stamp has no such month; skipping");
            continue;
        };
        latest = latest.max(Some((year, month)));

        let target = format!("TABLE_{}_{year}", month_label.to_uppercase());
        if book.get_sheet_by_name(&target).is_some() {
            info!(sheet = %target, "consolidated sheet already exists; skipping");
            continue;
        }
        let mut records = match excel_read::read_rate_records(&path, settings) {
            Ok(records) => records,
            Err(error) => {
                error!(file = %file_name, %error, "source file rejected");
                continue;
            }
        };
        sort_records(&mut records);

        excel_write::duplicate_sheet(
            &mut book,
            &master_path,
            &settings.master_template_sheet,
            &target,
        )?;
        let sheet = book
            .get_sheet_by_name_mut(&target)
            .ok_or_else(|| PipelineError::Workbook(format!("sheet '{target}' vanished")))?;
        excel_write::write_master_sheet(sheet, &records, settings.master_clear_rows);
        info!(file = %file_name, sheet = %target, rows = records.len(), "consolidated sheet added");
        added += 1;
    }

    let Some((year, month)) = latest else {
        info!("no stamped source files found; master left untouched");
        return Ok(None);
    };
    let month_label = month_name(month)
        .ok_or_else(|| PipelineError::Workbook(format!("month {month} out of range")))?;

    let target_dir = output_dir.join("master").join(year.to_string());
    fs::create_dir_all(&target_dir)?;
    let stem = Path::new(master_file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(master_file);
    let target = target_dir.join(format!("{stem} - {month_label} {year}.xlsx"));
    excel_write::save_workbook(&book, &target)?;
    info!(path = %target.display(), sheets_added = added, "master workbook saved");
    Ok(Some(target))
}

/// Emits one styled report per region for every consolidated sheet of the
/// master workbook. Existing report files are never overwritten.
#[instrument(
    level = "info",
    skip_all,
    fields(master = %master_path.display(), output = %output_dir.display())
)]
pub fn publish(
    master_path: &Path,
    template_path: &Path,
    output_dir: &Path,
    settings: &Settings,
    today: NaiveDate,
) -> Result<()> {
    if !master_path.exists() {
        return Err(PipelineError::MissingInput(master_path.to_path_buf()));
    }
    if !template_path.exists() {
        return Err(PipelineError::MissingInput(template_path.to_path_buf()));
    }

    for sheet_name in excel_read::sheet_names(master_path)? {
        let Some((month_label, year)) = consolidated_sheet_period(&sheet_name) else {
            continue;
        };
        let records = match excel_read::read_master_records(master_path, &sheet_name) {
            Ok(records) => records,
            Err(error) => {
                error!(sheet = %sheet_name, %error, "consolidated sheet rejected");
                continue;
            }
        };
        info!(sheet = %sheet_name, rows = records.len(), "publishing price lists");

        let month_title = title_case(&month_label);
        let target_dir = output_dir
            .join("regions")
            .join(year.to_string())
            .join(&month_label);
        fs::create_dir_all(&target_dir)?;

        for region in Region::ALL {
            let file_name = format!(
                "{} - {} - {month_title} {year}.xlsx",
                region.code(),
                settings.report_title
            );
            let target = target_dir.join(&file_name);
            if target.exists() {
                info!(file = %file_name, "report already exists; skipping");
                continue;
            }
            let regional: Vec<RateRecord> = records
                .iter()
                .filter(|record| record.region == region)
                .cloned()
                .collect();
            if regional.is_empty() {
                debug!(region = region.code(), "no records for region; skipping");
                continue;
            }
            match write_region_report(
                &target,
                template_path,
                regional,
                region,
                &month_title,
                year,
                settings,
                today,
            ) {
                Ok(rows) => info!(file = %file_name, rows, "report written"),
                Err(error) => error!(file = %file_name, %error, "report generation failed"),
            }
        }
    }
    Ok(())
}

/// Runs both stages back to back; publish is skipped when ingest had
/// nothing to do.
pub fn run(
    input_dir: &Path,
    output_dir: &Path,
    master_file: &str,
    template_file: &str,
    settings: &Settings,
    today: NaiveDate,
) -> Result<()> {
    let Some(master) = ingest(input_dir, output_dir, master_file, settings)? else {
        info!("nothing ingested; skipping the publish stage");
        return Ok(());
    };
    publish(
        &master,
        &input_dir.join(template_file),
        output_dir,
        settings,
        today,
    )
}

#[allow(clippy::too_many_arguments)]
fn write_region_report(
    target: &Path,
    template_path: &Path,
    records: Vec<RateRecord>,
    region: Region,
    month_title: &str,
    year: i32,
    settings: &Settings,
    today: NaiveDate,
) -> Result<usize> {
    let records = consolidate(records);

    let mut book = excel_write::open_workbook(template_path)?;
    let sheet = book
        .get_sheet_by_name_mut(&settings.report_template_sheet)
        .ok_or_else(|| PipelineError::MissingSheet {
            workbook: template_path.to_path_buf(),
            sheet: settings.report_template_sheet.clone(),
        })?;

    template::stamp_titles(sheet, region, month_title, year);
    let anchors = MarkerScan::new(sheet, settings.anchor_scan_start).find_anchors();
    let blocks = template::data_blocks(
        &anchors,
        settings.trailing_block_span,
        settings.footer_scan_start,
    );
    template::clear_blocks(sheet, &blocks, settings.block_width);

    let mut grouped: BTreeMap<DayGroup, Vec<RateRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(day_group(&record.day_spec)).or_default().push(record);
    }
    for (group, group_records) in &mut grouped {
        sort_records(group_records);
        if !anchors.contains_key(group) {
            debug!(%group, count = group_records.len(), "template has no section for group; records skipped");
        }
    }

    let written = template::project_blocks(sheet, &blocks, &grouped)?;
    template::patch_footer(sheet, settings.footer_scan_start, month_title, year, today);
    excel_write::save_workbook(&book, target)?;
    Ok(written)
}

/// `.xlsx` files in the input directory, master workbook excluded, in
/// sorted name order so runs are deterministic.
fn source_files(input_dir: &Path, master_file: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx"))
        })
        .filter(|path| {
            path.file_name().and_then(|name| name.to_str()) != Some(master_file)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Extracts the `_YYYY_MM` stamp from a source file name.
fn period_stamp(file_name: &str) -> Option<(i32, u32)> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"_(\d{4})_(\d{2})").expect("literal pattern compiles"));
    let captures = pattern.captures(file_name)?;
    let year = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// Splits a `TABLE_<MONTH>_<YEAR>` sheet name into its period parts.
fn consolidated_sheet_period(sheet_name: &str) -> Option<(String, i32)> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"^TABLE_([A-Z]+)_(\d{4})$").expect("literal pattern compiles"));
    let captures = pattern.captures(sheet_name.trim())?;
    let year = captures[2].parse().ok()?;
    Some((captures[1].to_string(), year))
}

/// English month name for a 1-based month number.
fn month_name(month: u32) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(2000, month, 1)?;
    Some(date.format("%B").to_string())
}

fn title_case(upper: &str) -> String {
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

//! Projection of ordered records onto the styled report template.
//!
//! The template is a hand-styled workbook: section start rows are not known
//! ahead of time and are rediscovered on every output workbook by scanning
//! for marker text. Writers must never touch member cells of merged ranges;
//! clearing or writing a merged child is undefined in the underlying format.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use umya_spreadsheet::Worksheet;

use crate::error::{PipelineError, Result};
use crate::model::{DayGroup, RateRecord, Region};
use crate::schedule::{normalize_day, normalize_text};

/// Row positions of the section markers, one per day group present.
pub type AnchorMap = BTreeMap<DayGroup, u32>;

/// A source of labeled anchor positions. The projector depends on this
/// capability only, not on how a concrete template encodes its sections.
pub trait AnchorSource {
    fn find_anchors(&self) -> AnchorMap;
}

/// Discovers anchors by scanning column A for marker text, starting at a
/// fixed offset. Labels containing `SATURDAY`/`SUNDAY` mark those blocks
/// (later occurrences replace earlier ones); the first other non-empty
/// label marks the weekday block and is recognized once.
pub struct MarkerScan<'a> {
    sheet: &'a Worksheet,
    scan_start: u32,
}

impl<'a> MarkerScan<'a> {
    pub fn new(sheet: &'a Worksheet, scan_start: u32) -> Self {
        Self { sheet, scan_start }
    }
}

impl AnchorSource for MarkerScan<'_> {
    fn find_anchors(&self) -> AnchorMap {
        let mut anchors = AnchorMap::new();
        let mut weekday_found = false;
        for row in self.scan_start..=self.sheet.get_highest_row() {
            let label = normalize_text(&self.sheet.get_value((1u32, row)));
            if label.is_empty() {
                continue;
            }
            if label.contains("SATURDAY") {
                anchors.insert(DayGroup::Saturday, row);
            } else if label.contains("SUNDAY") {
                anchors.insert(DayGroup::Sunday, row);
            } else if !weekday_found {
                anchors.insert(DayGroup::Weekday, row);
                weekday_found = true;
            }
        }
        anchors
    }
}

/// Writable row span of one day-group section. `start..=end`, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub group: DayGroup,
    pub start: u32,
    pub end: u32,
}

impl Block {
    pub fn capacity(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }
}

/// Derives the writable span of each anchored section: data starts two rows
/// below the marker and stops two rows above the next one. The last section
/// has no terminating marker and gets a fixed trailing span instead, bounded
/// above the footer region so clearing can never eat the footer text.
pub fn data_blocks(anchors: &AnchorMap, trailing_span: u32, footer_start: u32) -> Vec<Block> {
    let mut markers: Vec<(u32, DayGroup)> = anchors.iter().map(|(g, r)| (*r, *g)).collect();
    markers.sort_unstable();

    markers
        .iter()
        .enumerate()
        .map(|(index, (row, group))| Block {
            group: *group,
            start: row + 2,
            end: match markers.get(index + 1) {
                Some((next_row, _)) => next_row.saturating_sub(2),
                None => (row + trailing_span).min(footer_start.saturating_sub(2)),
            },
        })
        .collect()
}

/// Column/row bounds of every merged range on the sheet, captured up front
/// so later cell mutation does not fight the borrow of the range list.
fn merge_bounds(sheet: &Worksheet) -> Vec<(u32, u32, u32, u32)> {
    sheet
        .get_merge_cells()
        .iter()
        .filter_map(|range| parse_range(&range.get_range()))
        .collect()
}

/// True when (col, row) sits inside a merged range without being its
/// top-left anchor cell.
fn is_merged_child(bounds: &[(u32, u32, u32, u32)], col: u32, row: u32) -> bool {
    bounds.iter().any(|(c1, r1, c2, r2)| {
        col >= *c1 && col <= *c2 && row >= *r1 && row <= *r2 && !(col == *c1 && row == *r1)
    })
}

fn parse_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let mut parts = range.split(':');
    let (c1, r1) = parse_cell(parts.next()?)?;
    let (c2, r2) = match parts.next() {
        Some(cell) => parse_cell(cell)?,
        None => (c1, r1),
    };
    Some((c1.min(c2), r1.min(r2), c1.max(c2), r1.max(r2)))
}

fn parse_cell(cell: &str) -> Option<(u32, u32)> {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];
    if letters.is_empty() || digits.is_empty() {
        return None;
    }
    let col = letters
        .chars()
        .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1));
    let row: u32 = digits.parse().ok()?;
    Some((col, row))
}

/// Wipes the data span of every block across the fixed column width,
/// leaving merged children untouched and stopping at the sheet's last row.
pub fn clear_blocks(sheet: &mut Worksheet, blocks: &[Block], width: u32) {
    let bounds = merge_bounds(sheet);
    let highest = sheet.get_highest_row();
    for block in blocks {
        for row in block.start..=block.end.min(highest) {
            for col in 1..=width {
                if is_merged_child(&bounds, col, row) {
                    continue;
                }
                sheet.get_cell_mut((col, row)).set_value("");
            }
        }
    }
}

/// Writes each anchored group's records into consecutive rows below its
/// marker. Groups without an anchor were filtered out by the caller; a
/// group larger than its block fails loudly rather than spilling into the
/// next section.
pub fn project_blocks(
    sheet: &mut Worksheet,
    blocks: &[Block],
    grouped: &BTreeMap<DayGroup, Vec<RateRecord>>,
) -> Result<usize> {
    let bounds = merge_bounds(sheet);
    let mut written = 0;
    for block in blocks {
        let Some(records) = grouped.get(&block.group) else {
            continue;
        };
        if records.len() > block.capacity() {
            return Err(PipelineError::BlockOverflow {
                group: block.group,
                rows: records.len(),
                capacity: block.capacity(),
            });
        }
        for (offset, record) in records.iter().enumerate() {
            write_record_row(sheet, &bounds, block.start + offset as u32, record);
            written += 1;
        }
    }
    Ok(written)
}

fn write_record_row(
    sheet: &mut Worksheet,
    bounds: &[(u32, u32, u32, u32)],
    row: u32,
    record: &RateRecord,
) {
    let cells: [Option<String>; 8] = [
        Some(normalize_day(&record.day_spec).to_string()),
        Some(record.time_label().to_string()),
        Some(record.program_code.clone()),
        Some(record.program_name.clone()),
        Some(record.genre.clone()),
        record.price_30s.map(|price| price.to_string()),
        record.price_15s.map(|price| price.to_string()),
        record.price_10s.map(|price| price.to_string()),
    ];
    for (index, value) in cells.into_iter().enumerate() {
        let col = index as u32 + 1;
        if is_merged_child(bounds, col, row) {
            continue;
        }
        if let Some(value) = value {
            sheet.get_cell_mut((col, row)).set_value(value);
        }
    }
}

/// Stamps the report header with the period and territory.
pub fn stamp_titles(sheet: &mut Worksheet, region: Region, month_name: &str, year: i32) {
    sheet
        .get_cell_mut("A2")
        .set_value(format!("PRICE LIST {} {year}", month_name.to_uppercase()));
    sheet
        .get_cell_mut("A3")
        .set_value(format!("{} ({})", region.name().to_uppercase(), region.code()));
}

/// Rewrites the free-text footer cells matched by their fixed marker
/// substrings; every other cell in the trailing range is left alone.
pub fn patch_footer(
    sheet: &mut Worksheet,
    scan_start: u32,
    month_name: &str,
    year: i32,
    today: NaiveDate,
) {
    let highest_row = sheet.get_highest_row();
    let highest_col = sheet.get_highest_column();
    let mut patches: Vec<(u32, u32, String)> = Vec::new();
    for row in scan_start..=highest_row {
        for col in 1..=highest_col {
            let value = sheet.get_value((col, row));
            if value.is_empty() {
                continue;
            }
            if value.contains("VALID PRICE LIST") {
                patches.push((
                    col,
                    row,
                    format!(
                        "VALID PRICE LIST FOR PURCHASES MADE IN {} {year}",
                        month_name.to_uppercase()
                    ),
                ));
            } else if value.contains("UPDATED ON") {
                patches.push((col, row, format!("UPDATED ON {}", today.format("%d/%m/%Y"))));
            }
        }
    }
    for (col, row, value) in patches {
        sheet.get_cell_mut((col, row)).set_value(value);
    }
}

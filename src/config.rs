//! Runtime settings for the two pipeline stages.
//!
//! The strict/lenient asymmetry of the business policy is deliberate and is
//! surfaced here instead of being hardcoded at the call sites: a source file
//! missing a required column aborts that file (`strict_columns`), while rows
//! carrying an unmapped region code are dropped silently (`strict_regions`).

/// Settings shared by the ingest and publish stages.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Abort a source file when a required column is absent.
    pub strict_columns: bool,
    /// Treat an unmapped region code as a per-file error instead of
    /// silently dropping the row.
    pub strict_regions: bool,
    /// Name of the template sheet duplicated for each consolidated month.
    pub master_template_sheet: String,
    /// Name of the styled sheet inside the report template workbook.
    pub report_template_sheet: String,
    /// Title fragment used in report file names.
    pub report_title: String,
    /// First row inspected when scanning the report template for section
    /// markers.
    pub anchor_scan_start: u32,
    /// First row inspected when patching the report footer.
    pub footer_scan_start: u32,
    /// Rows granted to the block after the last anchor, which has no
    /// terminating marker to bound it.
    pub trailing_block_span: u32,
    /// Column width of a report data block.
    pub block_width: u32,
    /// Last row wiped in a freshly duplicated consolidated sheet.
    pub master_clear_rows: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strict_columns: true,
            strict_regions: false,
            master_template_sheet: "TABLE".to_string(),
            report_template_sheet: "PRICES 30S".to_string(),
            report_title: "Price List".to_string(),
            anchor_scan_start: 7,
            footer_scan_start: 50,
            trailing_block_span: 150,
            block_width: 8,
            master_clear_rows: 150,
        }
    }
}

//! Parser for platform campaign exports — raw CSV bytes to typed rows.
//!
//! Column order is not fixed across platform export versions, so headers
//! are resolved by name. Numeric cells tolerate a currency sign and
//! thousands separators; dates come in a handful of export formats.

use brain_core::error::{BrainError, BrainResult};
use brain_core::types::CampaignRow;
use chrono::NaiveDate;
use csv::StringRecord;
use tracing::debug;

pub const COL_CAMPAIGN: &str = "Campaign name";
pub const COL_SPEND: &str = "Amount spent (GBP)";
pub const COL_IMPRESSIONS: &str = "Impressions";
pub const COL_REACH: &str = "Reach";
pub const COL_CPR: &str = "Cost per results";
pub const COL_RESULTS: &str = "Results";
pub const COL_START: &str = "Reporting starts";
pub const COL_END: &str = "Reporting ends";

/// Resolved header positions for one upload.
struct ColumnMap {
    campaign: usize,
    spend: usize,
    impressions: usize,
    reach: usize,
    cpr: usize,
    results: usize,
    start: usize,
    end: usize,
}

impl ColumnMap {
    /// Locate every required column, reporting all absences at once.
    fn resolve(headers: &StringRecord) -> BrainResult<Self> {
        let mut missing = Vec::new();
        let mut find = |name: &'static str| match position(headers, name) {
            Some(idx) => idx,
            None => {
                missing.push(name);
                usize::MAX
            }
        };

        let map = Self {
            campaign: find(COL_CAMPAIGN),
            spend: find(COL_SPEND),
            impressions: find(COL_IMPRESSIONS),
            reach: find(COL_REACH),
            cpr: find(COL_CPR),
            results: find(COL_RESULTS),
            start: find(COL_START),
            end: find(COL_END),
        };

        if missing.is_empty() {
            Ok(map)
        } else {
            Err(BrainError::Schema(missing.join(", ")))
        }
    }

    fn parse_record(&self, row: usize, record: &StringRecord) -> BrainResult<CampaignRow> {
        let campaign_name = cell(record, self.campaign).to_string();
        if campaign_name.is_empty() {
            return Err(parse_err(row, COL_CAMPAIGN, "campaign name must not be empty"));
        }

        let amount_spent = money_cell(record, self.spend, row, COL_SPEND)?;
        if amount_spent < 0.0 {
            return Err(parse_err(row, COL_SPEND, "spend must be non-negative"));
        }

        let cost_per_result = optional_money_cell(record, self.cpr, row, COL_CPR)?;
        if cost_per_result.is_some_and(|c| c < 0.0) {
            return Err(parse_err(row, COL_CPR, "cost per result must be non-negative"));
        }

        let reporting_start = date_cell(record, self.start, row, COL_START)?;
        let reporting_end = date_cell(record, self.end, row, COL_END)?;
        if reporting_start > reporting_end {
            return Err(parse_err(row, COL_START, "reporting window is inverted"));
        }

        Ok(CampaignRow {
            campaign_name,
            amount_spent,
            impressions: count_cell(record, self.impressions, row, COL_IMPRESSIONS)?,
            reach: count_cell(record, self.reach, row, COL_REACH)?,
            cost_per_result,
            results: count_cell(record, self.results, row, COL_RESULTS)?,
            reporting_start,
            reporting_end,
        })
    }
}

/// Parse an uploaded campaign export into typed rows.
///
/// Pure transformation; the caller owns transport and persistence.
pub fn parse_rows(bytes: &[u8]) -> BrainResult<Vec<CampaignRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| BrainError::Schema(format!("unreadable header row: {e}")))?
        .clone();
    let columns = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row_no = i + 1;
        let record = result.map_err(|e| BrainError::Parse {
            row: row_no,
            message: format!("malformed CSV record: {e}"),
        })?;
        rows.push(columns.parse_record(row_no, &record)?);
    }

    debug!(rows = rows.len(), "parsed campaign export");
    Ok(rows)
}

/// Match headers by trimmed name; the first header may carry a UTF-8 BOM
/// from spreadsheet re-exports.
fn position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
}

fn cell<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

fn parse_err(row: usize, column: &str, detail: impl std::fmt::Display) -> BrainError {
    BrainError::Parse {
        row,
        message: format!("column '{column}': {detail}"),
    }
}

/// "£1,234.56" → 1234.56. Strips the currency sign and separators.
fn parse_money(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Export date formats seen in the wild: ISO, UK slashed, "Jan 7, 2024".
fn parse_date(s: &str) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    None
}

/// Empty spend cells are sum-neutral, so they read as zero.
fn money_cell(record: &StringRecord, idx: usize, row: usize, column: &str) -> BrainResult<f64> {
    let raw = cell(record, idx);
    if raw.is_empty() {
        return Ok(0.0);
    }
    parse_money(raw)
        .ok_or_else(|| parse_err(row, column, format!("cannot parse '{raw}' as an amount")))
}

/// An empty cost-per-result cell is undefined (zero-result rows), not zero.
fn optional_money_cell(
    record: &StringRecord,
    idx: usize,
    row: usize,
    column: &str,
) -> BrainResult<Option<f64>> {
    let raw = cell(record, idx);
    if raw.is_empty() {
        return Ok(None);
    }
    parse_money(raw)
        .map(Some)
        .ok_or_else(|| parse_err(row, column, format!("cannot parse '{raw}' as an amount")))
}

fn count_cell(record: &StringRecord, idx: usize, row: usize, column: &str) -> BrainResult<u64> {
    let raw = cell(record, idx);
    if raw.is_empty() {
        return Ok(0);
    }
    raw.replace(',', "")
        .parse()
        .map_err(|_| parse_err(row, column, format!("cannot parse '{raw}' as a count")))
}

fn date_cell(
    record: &StringRecord,
    idx: usize,
    row: usize,
    column: &str,
) -> BrainResult<NaiveDate> {
    let raw = cell(record, idx);
    parse_date(raw).ok_or_else(|| parse_err(row, column, format!("cannot parse '{raw}' as a date")))
}

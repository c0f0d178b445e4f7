use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source platform that produced a campaign performance export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignSource {
    Meta,
    Google,
    Tiktok,
}

impl CampaignSource {
    /// Wire/filename spelling of the source type.
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignSource::Meta => "META",
            CampaignSource::Google => "GOOGLE",
            CampaignSource::Tiktok => "TIKTOK",
        }
    }
}

impl fmt::Display for CampaignSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record from an uploaded performance export.
///
/// `cost_per_result` is `None` when the cell was empty — platforms leave
/// it blank for rows with zero results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignRow {
    pub campaign_name: String,
    /// Spend in GBP.
    pub amount_spent: f64,
    pub impressions: u64,
    pub reach: u64,
    pub cost_per_result: Option<f64>,
    pub results: u64,
    pub reporting_start: NaiveDate,
    pub reporting_end: NaiveDate,
}

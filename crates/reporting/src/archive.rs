//! Append-only archive of analysis results.
//!
//! Each successful analysis is written once as an indented JSON file and
//! never touched again. The filename carries a random token so two
//! requests for the same source type landing in the same second cannot
//! collide.

use crate::summary::WeeklyComparison;
use brain_core::error::BrainResult;
use brain_core::types::CampaignSource;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub struct SummaryArchive {
    dir: PathBuf,
}

impl SummaryArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one analysis as
    /// `campaign_analysis_<SOURCE>_<YYYYMMDD_HHMMSS>_<token>.json`,
    /// creating the directory if needed. Returns the path written.
    pub fn write(
        &self,
        source: CampaignSource,
        report: &WeeklyComparison,
    ) -> BrainResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let token = Uuid::new_v4().simple().to_string();
        let path = self.dir.join(format!(
            "campaign_analysis_{}_{}_{}.json",
            source.as_str(),
            timestamp,
            &token[..8]
        ));

        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)?;

        debug!(path = %path.display(), "analysis archived");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use brain_core::types::CampaignRow;
    use chrono::NaiveDate;

    fn sample_report() -> WeeklyComparison {
        let rows = vec![CampaignRow {
            campaign_name: "A".to_string(),
            amount_spent: 15.0,
            impressions: 150,
            reach: 130,
            cost_per_result: Some(1.5),
            results: 10,
            reporting_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            reporting_end: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        }];
        let summary = summarize(&rows).unwrap();
        WeeklyComparison {
            week1: summary.clone(),
            week2: summary,
        }
    }

    #[test]
    fn test_write_creates_directory_and_file() {
        let root = tempfile::tempdir().unwrap();
        let archive = SummaryArchive::new(root.path().join("results"));

        let path = archive.write(CampaignSource::Meta, &sample_report()).unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("campaign_analysis_META_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_written_record_round_trips() {
        let root = tempfile::tempdir().unwrap();
        let archive = SummaryArchive::new(root.path());
        let report = sample_report();

        let path = archive.write(CampaignSource::Google, &report).unwrap();
        let contents = fs::read_to_string(path).unwrap();

        // Indented for readability.
        assert!(contents.contains('\n'));
        let back: WeeklyComparison = serde_json::from_str(&contents).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_same_second_writes_do_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let archive = SummaryArchive::new(root.path());
        let report = sample_report();

        let first = archive.write(CampaignSource::Tiktok, &report).unwrap();
        let second = archive.write(CampaignSource::Tiktok, &report).unwrap();

        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }
}

//! Summary statistics over parsed campaign rows.
//!
//! The overview mirrors what account managers read off the platform UI
//! (formatted currency strings); `campaign_details` stays numeric for
//! machine consumers diffing week over week.

use brain_core::error::{BrainError, BrainResult};
use brain_core::types::CampaignRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overview {
    /// Count of distinct campaign names in the upload.
    pub total_campaigns: u64,
    /// Formatted as `£X.XX`.
    pub total_spend: String,
    pub total_impressions: u64,
    pub total_reach: u64,
    /// Simple mean of per-row cost-per-result over rows where it is
    /// defined, formatted as `£X.XX`. Not spend-weighted.
    pub average_cpr: String,
    pub total_results: u64,
}

/// Per-campaign aggregates, numeric rather than display-formatted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignDetail {
    pub results: u64,
    pub impressions: u64,
    pub amount_spent: f64,
    pub cost_per_results: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Aggregated view of one uploaded table. Recomputed per request,
/// never stored in memory beyond the response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignSummary {
    pub overview: Overview,
    pub campaign_details: BTreeMap<String, CampaignDetail>,
    pub date_range: DateRange,
}

/// Summaries for the two uploaded reporting weeks, computed independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyComparison {
    pub week1: CampaignSummary,
    pub week2: CampaignSummary,
}

/// Format a GBP amount the way the overview renders it: sign prefix,
/// exactly two decimals.
pub fn format_gbp(amount: f64) -> String {
    format!("£{:.2}", amount)
}

/// Mean over the defined cost-per-result values. Rows with an undefined
/// CPR (zero results) shrink the denominator rather than dragging the
/// mean toward zero.
fn mean_cpr<'a>(rows: impl Iterator<Item = &'a CampaignRow>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u64;
    for cpr in rows.filter_map(|r| r.cost_per_result) {
        sum += cpr;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Compute the summary for one parsed table.
///
/// An empty table has no date range to report, so it is rejected like any
/// other malformed upload.
pub fn summarize(rows: &[CampaignRow]) -> BrainResult<CampaignSummary> {
    let Some(first) = rows.first() else {
        return Err(BrainError::Parse {
            row: 0,
            message: "table contains no data rows".to_string(),
        });
    };

    let mut date_range = DateRange {
        start: first.reporting_start,
        end: first.reporting_end,
    };

    let mut total_spend = 0.0;
    let mut total_impressions = 0u64;
    let mut total_reach = 0u64;
    let mut total_results = 0u64;
    let mut groups: BTreeMap<&str, Vec<&CampaignRow>> = BTreeMap::new();

    for row in rows {
        total_spend += row.amount_spent;
        total_impressions += row.impressions;
        total_reach += row.reach;
        total_results += row.results;
        date_range.start = date_range.start.min(row.reporting_start);
        date_range.end = date_range.end.max(row.reporting_end);
        groups.entry(&row.campaign_name).or_default().push(row);
    }

    let campaign_details = groups
        .iter()
        .map(|(name, members)| {
            let detail = CampaignDetail {
                results: members.iter().map(|r| r.results).sum(),
                impressions: members.iter().map(|r| r.impressions).sum(),
                amount_spent: members.iter().map(|r| r.amount_spent).sum(),
                cost_per_results: mean_cpr(members.iter().copied()),
            };
            (name.to_string(), detail)
        })
        .collect();

    Ok(CampaignSummary {
        overview: Overview {
            total_campaigns: groups.len() as u64,
            total_spend: format_gbp(total_spend),
            total_impressions,
            total_reach,
            average_cpr: format_gbp(mean_cpr(rows.iter())),
            total_results,
        },
        campaign_details,
        date_range,
    })
}

/// Summarize two reporting weeks independently under stable keys.
/// Each table is aggregated from its own rows alone; nothing is shared
/// between the two computations.
pub fn compare_weeks(
    week1: &[CampaignRow],
    week2: &[CampaignRow],
) -> BrainResult<WeeklyComparison> {
    Ok(WeeklyComparison {
        week1: summarize(week1)?,
        week2: summarize(week2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        name: &str,
        spend: f64,
        impressions: u64,
        reach: u64,
        cpr: Option<f64>,
        results: u64,
    ) -> CampaignRow {
        CampaignRow {
            campaign_name: name.to_string(),
            amount_spent: spend,
            impressions,
            reach,
            cost_per_result: cpr,
            results,
            reporting_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            reporting_end: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        }
    }

    #[test]
    fn test_single_campaign_example() {
        let rows = vec![
            row("A", 10.0, 100, 90, Some(2.0), 5),
            row("A", 5.0, 50, 40, Some(1.0), 5),
        ];
        let summary = summarize(&rows).unwrap();

        assert_eq!(summary.overview.total_campaigns, 1);
        assert_eq!(summary.overview.total_spend, "£15.00");
        assert_eq!(summary.overview.total_impressions, 150);
        assert_eq!(summary.overview.total_reach, 130);
        assert_eq!(summary.overview.average_cpr, "£1.50");
        assert_eq!(summary.overview.total_results, 10);

        let detail = &summary.campaign_details["A"];
        assert_eq!(detail.results, 10);
        assert_eq!(detail.impressions, 150);
        assert_eq!(detail.amount_spent, 15.0);
        assert_eq!(detail.cost_per_results, 1.5);

        assert_eq!(
            summary.date_range.start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            summary.date_range.end,
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
        );
    }

    #[test]
    fn test_distinct_campaigns_counted_once() {
        let rows = vec![
            row("A", 1.0, 10, 9, Some(1.0), 1),
            row("B", 2.0, 20, 18, Some(2.0), 2),
            row("A", 3.0, 30, 27, Some(3.0), 3),
        ];
        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.overview.total_campaigns, 2);
        assert_eq!(summary.campaign_details.len(), 2);
    }

    #[test]
    fn test_detail_results_sum_to_total() {
        let rows = vec![
            row("A", 1.0, 10, 9, Some(1.0), 4),
            row("B", 2.0, 20, 18, Some(2.0), 6),
            row("C", 3.0, 30, 27, None, 0),
        ];
        let summary = summarize(&rows).unwrap();
        let detail_results: u64 = summary.campaign_details.values().map(|d| d.results).sum();
        assert_eq!(summary.overview.total_results, detail_results);
    }

    #[test]
    fn test_spend_formatting_two_decimals() {
        let rows = vec![row("A", 0.1, 1, 1, Some(0.1), 1)];
        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.overview.total_spend, "£0.10");

        let rows = vec![row("A", 1234.5, 1, 1, Some(0.1), 1)];
        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.overview.total_spend, "£1234.50");
    }

    #[test]
    fn test_undefined_cpr_excluded_from_means() {
        // Two defined values and one blank: mean over the two, not three.
        let rows = vec![
            row("A", 1.0, 10, 9, Some(2.0), 1),
            row("A", 1.0, 10, 9, Some(4.0), 1),
            row("A", 1.0, 10, 9, None, 0),
        ];
        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.overview.average_cpr, "£3.00");
        assert_eq!(summary.campaign_details["A"].cost_per_results, 3.0);
    }

    #[test]
    fn test_no_defined_cpr_reads_as_zero() {
        let rows = vec![row("A", 1.0, 10, 9, None, 0)];
        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.overview.average_cpr, "£0.00");
        assert_eq!(summary.campaign_details["A"].cost_per_results, 0.0);
    }

    #[test]
    fn test_date_range_spans_all_rows() {
        let mut early = row("A", 1.0, 10, 9, Some(1.0), 1);
        early.reporting_start = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        early.reporting_end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let mut late = row("B", 1.0, 10, 9, Some(1.0), 1);
        late.reporting_start = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        late.reporting_end = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();

        let summary = summarize(&[early, late, row("C", 1.0, 10, 9, Some(1.0), 1)]).unwrap();
        assert_eq!(
            summary.date_range.start,
            NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
        );
        assert_eq!(
            summary.date_range.end,
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
        );
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            row("A", 10.0, 100, 90, Some(2.0), 5),
            row("B", 5.0, 50, 40, None, 0),
        ];
        assert_eq!(summarize(&rows).unwrap(), summarize(&rows).unwrap());
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = summarize(&[]).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_weeks_are_independent() {
        let week1 = vec![row("A", 10.0, 100, 90, Some(2.0), 5)];
        let week2 = vec![
            row("B", 4.0, 40, 36, Some(1.0), 4),
            row("C", 6.0, 60, 54, Some(3.0), 2),
        ];
        let comparison = compare_weeks(&week1, &week2).unwrap();

        assert_eq!(comparison.week1, summarize(&week1).unwrap());
        assert_eq!(comparison.week2, summarize(&week2).unwrap());
        assert_eq!(comparison.week1.overview.total_campaigns, 1);
        assert_eq!(comparison.week2.overview.total_campaigns, 2);
    }

    #[test]
    fn test_serialized_shape() {
        let rows = vec![row("A", 15.0, 150, 130, Some(1.5), 10)];
        let summary = summarize(&rows).unwrap();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["overview"]["total_spend"], "£15.00");
        assert_eq!(json["campaign_details"]["A"]["results"], 10);
        assert_eq!(json["date_range"]["start"], "2024-01-01");
        assert_eq!(json["date_range"]["end"], "2024-01-07");
    }
}

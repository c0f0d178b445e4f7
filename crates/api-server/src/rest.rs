//! REST API handlers for campaign analysis and operational endpoints.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use brain_core::error::{BrainError, BrainResult};
use brain_core::types::{CampaignRow, CampaignSource};
use brain_reporting::archive::SummaryArchive;
use brain_reporting::summary::{compare_weeks, WeeklyComparison};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Multipart field names for the two reporting weeks, in upload order.
const UPLOAD_FIELDS: [&str; 2] = ["file1", "file2"];

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    /// Absent when archiving is disabled.
    pub archive: Option<Arc<SummaryArchive>>,
    pub start_time: Instant,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub campaign_type: CampaignSource,
}

/// POST /api/analyze-campaigns — aggregate two weekly exports.
///
/// Parsing and aggregation failures come back as a structured payload
/// whose `error` field is the stable error kind; the status code follows
/// the kind rather than collapsing everything to 200.
pub async fn analyze_campaigns(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
    multipart: Multipart,
) -> Result<Json<WeeklyComparison>, (StatusCode, Json<ErrorResponse>)> {
    metrics::counter!("api.analyze.requests").increment(1);

    let [file1, file2] = read_uploads(multipart).await?;

    let report = analyze(&file1, &file2).map_err(|e| {
        warn!(error = %e, kind = e.kind(), campaign_type = %params.campaign_type, "Campaign analysis failed");
        metrics::counter!("api.analyze.errors").increment(1);
        reject(&e)
    })?;

    if let Some(archive) = &state.archive {
        // Durability convenience only: an unwritable archive must not
        // fail a request that already produced a valid report.
        match archive.write(params.campaign_type, &report) {
            Ok(path) => {
                info!(path = %path.display(), campaign_type = %params.campaign_type, "Analysis archived");
            }
            Err(e) => {
                warn!(error = %e, "Failed to archive analysis");
                metrics::counter!("archive.write_failures").increment(1);
            }
        }
    }

    Ok(Json(report))
}

/// Parse both uploads and aggregate each week from its own rows alone.
fn analyze(file1: &[u8], file2: &[u8]) -> BrainResult<WeeklyComparison> {
    let week1: Vec<CampaignRow> = brain_ingest::parse_rows(file1)?;
    let week2: Vec<CampaignRow> = brain_ingest::parse_rows(file2)?;
    compare_weeks(&week1, &week2)
}

/// Collect the `file1`/`file2` multipart fields, in either order.
async fn read_uploads(
    mut multipart: Multipart,
) -> Result<[Vec<u8>; 2], (StatusCode, Json<ErrorResponse>)> {
    let mut uploads: [Option<Vec<u8>>; 2] = [None, None];

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                metrics::counter!("api.validation_errors").increment(1);
                return Err(bad_request(format!("unreadable multipart body: {e}")));
            }
        };

        let Some(slot) = field
            .name()
            .and_then(|name| UPLOAD_FIELDS.iter().position(|f| *f == name))
        else {
            continue;
        };

        match field.bytes().await {
            Ok(bytes) => uploads[slot] = Some(bytes.to_vec()),
            Err(e) => {
                metrics::counter!("api.validation_errors").increment(1);
                return Err(bad_request(format!(
                    "unreadable upload '{}': {e}",
                    UPLOAD_FIELDS[slot]
                )));
            }
        }
    }

    match uploads {
        [Some(file1), Some(file2)] => Ok([file1, file2]),
        [first, second] => {
            let missing = if first.is_none() {
                UPLOAD_FIELDS[0]
            } else {
                debug_assert!(second.is_none());
                UPLOAD_FIELDS[1]
            };
            metrics::counter!("api.validation_errors").increment(1);
            Err(bad_request(format!(
                "multipart field '{missing}' is required"
            )))
        }
    }
}

/// GET /api/health — health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /ready — readiness probe for Kubernetes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error kind: `schema`, `parse`, `upload`, `io`, ...
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Map pipeline error kinds to status codes: malformed uploads are the
/// client's problem, everything else is ours.
fn reject(err: &BrainError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        BrainError::Schema(_) | BrainError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.kind().to_string(),
            message: err.to_string(),
        }),
    )
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "upload".to_string(),
            message,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_and_parse_errors_are_unprocessable() {
        let (status, Json(body)) = reject(&BrainError::Schema("Reach".into()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "schema");
        assert!(body.message.contains("Reach"));

        let (status, Json(body)) = reject(&BrainError::Parse {
            row: 2,
            message: "bad cell".into(),
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "parse");
    }

    #[test]
    fn test_io_errors_are_internal() {
        let err = BrainError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let (status, Json(body)) = reject(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "io");
    }

    #[test]
    fn test_analyze_composes_both_weeks() {
        let csv = b"Campaign name,Amount spent (GBP),Impressions,Reach,Cost per results,Results,Reporting starts,Reporting ends\nA,10.00,100,90,2.00,5,2024-01-01,2024-01-07";
        let report = analyze(csv, csv).unwrap();
        assert_eq!(report.week1, report.week2);
        assert_eq!(report.week1.overview.total_spend, "£10.00");
    }
}

//! History listing, statistics and the statistics report

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use tracing::debug;

use medirisk_common::MediRiskError;
use medirisk_persistence::{Page, PredictionRecord, PredictionStatistics, StatisticsSummary};
use medirisk_report::{ReportKind, statistics_report};

use super::model::HistoryParams;
use super::storage_error;
use crate::error::AppError;
use crate::metrics;
use crate::model::{
    AppState, NO_STATISTICS_DATA, STATISTICS_REPORT_FILE,
    response::{Result as ApiResult, pdf_attachment},
};

type HandlerResult = Result<HttpResponse, AppError>;

fn no_data() -> AppError {
    MediRiskError::ResourceNotFound(NO_STATISTICS_DATA.to_string()).into()
}

async fn all_records(data: &AppState) -> Result<Vec<PredictionRecord>, AppError> {
    data.persistence
        .prediction_find_all()
        .await
        .map_err(storage_error)
}

/// GET /history?diseaseType=&pageNo=&pageSize= - newest first
#[get("/history")]
pub async fn history(data: web::Data<AppState>, params: web::Query<HistoryParams>) -> HandlerResult {
    let query = params.to_query()?;
    let page = data
        .persistence
        .prediction_find_page(&query)
        .await
        .map_err(storage_error)?;
    debug!(
        disease = ?query.disease_type,
        page_no = query.page_no,
        total = page.total_count,
        "History page served"
    );
    Ok(ApiResult::<Page<PredictionRecord>>::http_success(page))
}

/// GET /statistics - counts per risk level and disease
#[get("/statistics")]
pub async fn statistics(data: web::Data<AppState>) -> HandlerResult {
    let records = all_records(&data).await?;
    let stats = PredictionStatistics::from_records(&records).ok_or_else(no_data)?;
    Ok(ApiResult::<PredictionStatistics>::http_success(stats))
}

/// GET /statistics/summary - statistics plus period and daily evolution
#[get("/statistics/summary")]
pub async fn statistics_summary(data: web::Data<AppState>) -> HandlerResult {
    let records = all_records(&data).await?;
    let summary = StatisticsSummary::from_records(&records).ok_or_else(no_data)?;
    Ok(ApiResult::<StatisticsSummary>::http_success(summary))
}

/// GET /statistics_report - PDF of the summary
#[get("/statistics_report")]
pub async fn statistics_pdf(data: web::Data<AppState>) -> HandlerResult {
    let records = all_records(&data).await?;
    let pdf = web::block(move || {
        StatisticsSummary::from_records(&records).map(|s| statistics_report(&s, Utc::now()))
    })
    .await
    .map_err(|e| MediRiskError::ReportError(e.to_string()))?
    .ok_or_else(no_data)?;

    metrics::record_report(ReportKind::Statistics);
    Ok(pdf_attachment(STATISTICS_REPORT_FILE, pdf))
}

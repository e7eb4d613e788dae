//! Prediction and prediction report endpoints

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::Utc;
use tracing::{debug, info};

use medirisk_common::MediRiskError;
use medirisk_persistence::PredictionRecord;
use medirisk_predict::{DiseaseType, Prediction};
use medirisk_report::{ReportKind, prediction_report};

use super::model::PredictRequest;
use super::{auth_context, storage_error};
use crate::error::AppError;
use crate::metrics;
use crate::model::{
    AppState, HEALTH_REPORT_FILE, NO_PREDICTION_FOUND,
    response::{Result, pdf_attachment},
};

/// Render a prediction report off the async workers
pub async fn render_prediction(
    prediction: Prediction,
    author: String,
) -> std::result::Result<Vec<u8>, AppError> {
    let pdf = web::block(move || prediction_report(&prediction, &author, Utc::now()))
        .await
        .map_err(|e| MediRiskError::ReportError(e.to_string()))?;
    metrics::record_report(ReportKind::Prediction);
    Ok(pdf)
}

/// POST /predict
///
/// Validates and scores the submitted metrics, stores the result and
/// returns it. The record carries the caller's id when a valid token is sent.
#[post("/predict")]
pub async fn predict(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<PredictRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let PredictRequest {
        disease_type,
        data: input,
    } = body.into_inner();
    let disease = disease_type.unwrap_or_default();
    let input = input.unwrap_or_default();

    let prediction = match data.engine.predict(disease.trim(), &input) {
        Ok(prediction) => prediction,
        Err(e) => {
            debug!(disease = %disease, reason = e.reason(), "Prediction rejected");
            metrics::record_prediction_error(disease.trim(), e.reason());
            return Err(e.into());
        }
    };

    let user_id = auth_context(&req).user_id().map(str::to_string);
    let record = PredictionRecord::new(prediction.clone(), user_id);
    let record_id = record.id.clone();
    if let Err(e) = data.persistence.prediction_add(record).await {
        metrics::record_prediction_error(prediction.disease_type.as_str(), "storage");
        return Err(storage_error(e));
    }

    metrics::record_prediction(prediction.disease_type, prediction.risk_level);
    info!(
        record_id = %record_id,
        disease = %prediction.disease_type,
        risk_level = prediction.risk_level.as_str(),
        probability = prediction.probability,
        "Prediction stored"
    );

    Ok(Result::<Prediction>::http_success(prediction))
}

/// POST /generate_report - PDF for the prediction in the body
#[post("/generate_report")]
pub async fn generate_report(
    data: web::Data<AppState>,
    body: web::Json<Prediction>,
) -> std::result::Result<HttpResponse, AppError> {
    let pdf = render_prediction(body.into_inner(), data.report_author()).await?;
    Ok(pdf_attachment(HEALTH_REPORT_FILE, pdf))
}

/// GET /download_report/{disease_type} - PDF for the latest prediction of a disease
#[get("/download_report/{disease_type}")]
pub async fn download_report(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> std::result::Result<HttpResponse, AppError> {
    let disease: DiseaseType = path.into_inner().trim().parse()?;

    let record = data
        .persistence
        .prediction_find_last(disease)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| MediRiskError::ResourceNotFound(NO_PREDICTION_FOUND.to_string()))?;

    let pdf = render_prediction(record.prediction, data.report_author()).await?;
    let file_name = format!(
        "report_{}_{}.pdf",
        disease,
        Utc::now().format("%Y%m%d_%H%M")
    );
    Ok(pdf_attachment(&file_name, pdf))
}

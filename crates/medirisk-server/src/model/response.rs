//! HTTP response types for the MediRisk server
//!
//! Every JSON response is wrapped in a `{code, message, data}` envelope.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use serde::{Deserialize, Serialize};

use medirisk_common::error::SUCCESS;

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        Result::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: SUCCESS.code,
            message: SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::success(data))
    }

    pub fn http_response(
        status: u16,
        code: i32,
        message: String,
        data: impl Serialize,
    ) -> HttpResponse {
        HttpResponseBuilder::new(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .json(Result::new(code, message, data))
    }
}

/// PDF download with an attachment disposition
pub fn pdf_attachment(file_name: &str, body: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(medirisk_report::PDF_CONTENT_TYPE)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name.to_string())],
        })
        .body(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let value = serde_json::to_value(Result::success(3)).unwrap();
        assert_eq!(value["code"], 0);
        assert_eq!(value["message"], "success");
        assert_eq!(value["data"], 3);
    }

    #[test]
    fn test_http_response_status() {
        let resp = Result::<()>::http_response(404, 20004, "missing".to_string(), ());
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = Result::<()>::http_response(42, 30000, "odd".to_string(), ());
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_pdf_attachment_headers() {
        let resp = pdf_attachment("health_report.pdf", b"%PDF-1.4".to_vec());
        let headers = resp.headers();
        assert_eq!(headers.get("content-type").unwrap(), "application/pdf");
        assert_eq!(
            headers.get("content-disposition").unwrap(),
            "attachment; filename=\"health_report.pdf\""
        );
    }
}

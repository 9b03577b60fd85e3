//! Repair inquiry route handlers.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use satchel_core::{InquiryId, InquiryStatus};

use crate::db::InquiryRepository;
use crate::db::inquiries::{InquiryUpdate, ServiceInquiry};
use crate::error::{AppError, Result};
use crate::services::export;
use crate::state::AppState;

/// Inquiry update request body. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateInquiryBody {
    pub status: Option<String>,
    pub quoted_price: Option<Decimal>,
    pub admin_notes: Option<String>,
}

/// List all repair inquiries, newest first.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ServiceInquiry>>> {
    let inquiries = InquiryRepository::new(state.pool()).list().await?;
    Ok(Json(inquiries))
}

/// Download all inquiries as a CSV attachment.
#[instrument(skip(state))]
pub async fn export(State(state): State<AppState>) -> Result<Response> {
    let inquiries = InquiryRepository::new(state.pool()).list().await?;
    let csv = export::inquiries_to_csv(&inquiries);
    let filename = export::export_filename(chrono::Utc::now());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Update an inquiry's status, quoted price, or notes.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateInquiryBody>,
) -> Result<Json<ServiceInquiry>> {
    let status = body
        .status
        .as_deref()
        .map(str::parse::<InquiryStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let inquiry = InquiryRepository::new(state.pool())
        .update(
            InquiryId::new(id),
            InquiryUpdate {
                status,
                quoted_price: body.quoted_price,
                admin_notes: body.admin_notes,
            },
        )
        .await?;

    Ok(Json(inquiry))
}

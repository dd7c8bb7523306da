use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::auth::auth::AuthUser;
use crate::error::Error;
use crate::leave::export;
use crate::model::leave_request::{LeaveStatus, LeaveType};
use crate::store::RequestFilter;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    #[schema(example = "approved")]
    pub status: Option<LeaveStatus>,
    #[serde(rename = "type")]
    #[schema(example = "vacation")]
    pub leave_type: Option<LeaveType>,
    #[schema(example = 2026)]
    pub year: Option<i32>,
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
}

/// CSV download of matching requests, one row each. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/leave/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn export_csv(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, Error> {
    auth.require_admin()?;

    let filter = RequestFilter {
        status: query.status,
        leave_type: query.leave_type,
        year: query.year,
        employee_id: query.employee_id,
        page: None,
        per_page: None,
    };
    let rows = state.service.export_rows(auth.tenant_id, &filter).await?;
    let body = export::to_csv(&rows);

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"leave_requests.csv\"",
        ))
        .body(body))
}

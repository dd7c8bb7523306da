use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::auth::auth::AuthUser;
use crate::error::Error;
use crate::leave::lifecycle::SubmitLeave;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, ReviewAction};
use crate::store::RequestFilter;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "vacation")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-07-06", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-07-10", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    /// Take only the afternoon of the first day
    #[serde(default)]
    pub start_half: bool,
    /// Take only the morning of the last day
    #[serde(default)]
    pub end_half: bool,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "approve")]
    pub action: ReviewAction,
    /// Mandatory when rejecting; stored as review notes when approving.
    #[schema(example = "team coverage")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<LeaveStatus>,
    /// Filter by absence category
    #[schema(example = "vacation")]
    #[serde(rename = "type")]
    pub leave_type: Option<LeaveType>,
    /// Filter by the year the leave starts in
    #[schema(example = 2026)]
    pub year: Option<i32>,
    /// Filter by employee ID
    #[schema(example = 123)]
    pub employee_id: Option<u64>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

impl From<&LeaveFilter> for RequestFilter {
    fn from(q: &LeaveFilter) -> Self {
        RequestFilter {
            status: q.status,
            leave_type: q.leave_type,
            year: q.year,
            employee_id: q.employee_id,
            page: q.page,
            per_page: q.per_page,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates or empty working range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Overlaps an open request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, Error> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| Error::Forbidden("No employee profile".into()))?;

    let payload = payload.into_inner();
    let request = state
        .service
        .submit(
            auth.tenant_id,
            employee_id,
            SubmitLeave {
                leave_type: payload.leave_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                start_half: payload.start_half,
                end_half: payload.end_half,
                reason: payload.reason,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Review leave (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave/{leave_id}/review",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to review")
    ),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Review recorded", body = LeaveRequest),
        (status = 400, description = "Missing rejection reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn review_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> Result<HttpResponse, Error> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();
    let payload = payload.into_inner();
    let updated = state
        .service
        .review(
            auth.tenant_id,
            leave_id,
            payload.action,
            payload.reason,
            auth.user_id,
        )
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, Error> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();
    let request = state.service.get(auth.tenant_id, leave_id).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, Error> {
    auth.require_hr_or_admin()?;

    let mut filter = RequestFilter::from(&*query);
    filter.per_page = Some(filter.per_page.unwrap_or(10).min(100));
    filter.page = Some(filter.page.unwrap_or(1).max(1));

    let (data, total) = state.service.list(auth.tenant_id, &filter).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: filter.page.unwrap_or(1),
        per_page: filter.per_page.unwrap_or(10),
        total,
    }))
}

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::auth::auth::AuthUser;
use crate::error::Error;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    #[schema(example = 7, minimum = 1, maximum = 12)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: i32,
}

/// Month grid of pending and approved leave, keyed by ISO date. Weekends
/// never appear; approved requests already underway show as `in_progress`.
#[utoipa::path(
    get,
    path = "/api/v1/leave/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Calendar grid", body = Object, example = json!({
            "month": 7,
            "year": 2026,
            "calendarData": {
                "2026-07-06": [
                    {"id": 1, "employeeId": 1000, "employeeName": "John Doe",
                     "type": "vacation", "status": "approved", "startHalf": true}
                ]
            }
        })),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn calendar_view(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse, Error> {
    let today = Utc::now().date_naive();
    let grid = state
        .service
        .calendar(auth.tenant_id, query.year, query.month, today)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "month": query.month,
        "year": query.year,
        "calendarData": grid
    })))
}

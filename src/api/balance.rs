use actix_web::{HttpResponse, web};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::auth::auth::AuthUser;
use crate::error::Error;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Calendar year; defaults to the current year
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeName {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
}

/// Per-employee summary row. Vacation figures are days; permits are ROL
/// hours. Sick has no entitlement, so `sickDays` stays zero.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub employee: EmployeeName,
    #[schema(example = "26", value_type = String)]
    pub vacation_days: Decimal,
    #[schema(example = "3", value_type = String)]
    pub vacation_used: Decimal,
    #[schema(example = "23", value_type = String)]
    pub vacation_remaining: Decimal,
    #[schema(example = 0)]
    pub sick_days: i64,
    #[schema(example = 2)]
    pub sick_used: i64,
    #[schema(example = "56", value_type = String)]
    pub permits: Decimal,
    #[schema(example = "16", value_type = String)]
    pub permits_used: Decimal,
}

/// Balance overview for every active employee; missing records are created
/// with the annual defaults on first read.
#[utoipa::path(
    get,
    path = "/api/v1/leave/balances",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balance rows", body = [BalanceSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn balance_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, Error> {
    auth.require_hr_or_admin()?;

    let year = query.year.unwrap_or_else(|| chrono::Utc::now().year());
    let rows = state.service.balances(auth.tenant_id, year).await?;

    let summaries: Vec<BalanceSummary> = rows
        .into_iter()
        .map(|(employee, balance)| BalanceSummary {
            employee_id: employee.id,
            employee: EmployeeName {
                first_name: employee.first_name,
                last_name: employee.last_name,
            },
            vacation_days: balance.vacation_total + balance.vacation_carry_over,
            vacation_used: balance.vacation_used,
            vacation_remaining: balance.vacation_remaining(),
            sick_days: 0,
            sick_used: balance.sick_days_used,
            permits: balance.rol_total,
            permits_used: balance.rol_used,
        })
        .collect();

    Ok(HttpResponse::Ok().json(summaries))
}

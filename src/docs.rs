use crate::api::balance::{BalanceQuery, BalanceSummary, EmployeeName};
use crate::api::calendar::CalendarQuery;
use crate::api::export::ExportQuery;
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, ReviewLeave};
use crate::leave::calendar::CalendarEntry;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, ReviewAction};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave & Absence API",
        version = "1.0.0",
        description = r#"
## Leave/Absence Request Lifecycle and Balance Ledger

Tenant-scoped leave management for the HR platform.

### 🔹 Key Features
- **Requests**
  - Submit leave, review (approve/reject), list and inspect history
- **Balances**
  - Per-employee, per-year entitlement ledger across absence categories
- **Calendar**
  - Day-indexed month view with business-day and half-day semantics
- **Export**
  - CSV download of filtered requests

### 🔐 Security
All endpoints require **JWT Bearer authentication**; review, balances and
export are limited to **Admin**/**HR** roles.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::review_leave,

        crate::api::balance::balance_list,
        crate::api::calendar::calendar_view,
        crate::api::export::export_csv,
    ),
    components(
        schemas(
            LeaveType,
            LeaveStatus,
            ReviewAction,
            LeaveRequest,
            CreateLeave,
            ReviewLeave,
            LeaveFilter,
            LeaveListResponse,
            BalanceQuery,
            BalanceSummary,
            EmployeeName,
            CalendarQuery,
            CalendarEntry,
            ExportQuery
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request, balance, calendar and export APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

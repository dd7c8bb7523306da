//! Request lifecycle manager: the authoritative state machine for a leave
//! request, composing the store's atomic review transaction with the
//! entitlement ledger and the decision outbox.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::events::{DecisionEvent, EventOutbox};
use crate::leave::calendar::{self, CalendarEntry, ProjectionInput};
use crate::leave::export::{self, ExportRow};
use crate::model::employee::Employee;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, ReviewAction};
use crate::store::{LeaveStore, NewLeaveRequest, RequestFilter, ReviewDecision};

/// Submission payload, already authenticated and tenant-resolved.
#[derive(Debug, Clone)]
pub struct SubmitLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_half: bool,
    pub end_half: bool,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    outbox: EventOutbox,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>, outbox: EventOutbox) -> Self {
        LeaveService { store, outbox }
    }

    /// Working time consumed by a span: business days, minus half a day for
    /// each half-day flag that lands on a business day.
    fn working_days(submit: &SubmitLeave) -> Decimal {
        let mut days = Decimal::from(calendar::business_days_between(
            submit.start_date,
            submit.end_date,
        ));
        let half = Decimal::new(5, 1);
        if submit.start_half && calendar::is_business_day(submit.start_date) {
            days -= half;
        }
        if submit.end_half
            && submit.end_date != submit.start_date
            && calendar::is_business_day(submit.end_date)
        {
            days -= half;
        }
        days
    }

    /// Creates a PENDING request, reserving its quantity on the balance in
    /// the same unit of work.
    pub async fn submit(
        &self,
        tenant_id: u64,
        employee_id: u64,
        submit: SubmitLeave,
    ) -> Result<LeaveRequest> {
        if submit.start_date > submit.end_date {
            return Err(Error::validation("start_date cannot be after end_date"));
        }

        let total_days = Self::working_days(&submit);
        if total_days <= Decimal::ZERO {
            return Err(Error::validation(
                "requested range contains no working time",
            ));
        }

        let overlapping = self
            .store
            .requests_in_range(tenant_id, submit.start_date, submit.end_date)
            .await?;
        if overlapping.iter().any(|r| r.employee_id == employee_id) {
            return Err(Error::conflict(
                "an open request already covers part of this range",
            ));
        }

        let total_hours = submit
            .leave_type
            .hour_denominated()
            .then(|| total_days * Decimal::from(8));

        self.store
            .insert_request(NewLeaveRequest {
                tenant_id,
                employee_id,
                leave_type: submit.leave_type,
                start_date: submit.start_date,
                end_date: submit.end_date,
                start_half: submit.start_half,
                end_half: submit.end_half,
                total_days,
                total_hours,
                reason: submit.reason,
            })
            .await
    }

    /// Reviews a PENDING request. Exactly one of two concurrent calls
    /// succeeds; the loser and every later call get a Conflict and cause no
    /// balance movement.
    pub async fn review(
        &self,
        tenant_id: u64,
        request_id: u64,
        action: ReviewAction,
        reason: Option<String>,
        reviewer_id: u64,
    ) -> Result<LeaveRequest> {
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if action == ReviewAction::Reject && reason.is_none() {
            return Err(Error::validation("Rejection reason is required"));
        }

        let current = self
            .store
            .get_request(tenant_id, request_id)
            .await?
            .ok_or_else(|| Error::not_found("Leave request not found"))?;
        if !current.is_pending() {
            return Err(Error::conflict("Leave request already processed"));
        }

        let status = match action {
            ReviewAction::Approve => LeaveStatus::Approved,
            ReviewAction::Reject => LeaveStatus::Rejected,
        };
        let decision = ReviewDecision {
            status,
            reviewer_id,
            reviewed_at: Utc::now(),
            notes: reason,
        };
        let updated = self
            .store
            .commit_review(tenant_id, request_id, decision)
            .await?;

        // Best-effort fan-out; the decision is already durable.
        let notify_user_id = match self.store.get_employee(tenant_id, updated.employee_id).await {
            Ok(employee) => employee.and_then(|e| e.user_id),
            Err(e) => {
                tracing::warn!(error = %e, request_id, "employee lookup for notification failed");
                None
            }
        };
        self.outbox.publish(DecisionEvent {
            event_id: String::new(),
            tenant_id,
            request_id: updated.id,
            employee_id: updated.employee_id,
            notify_user_id,
            old_status: LeaveStatus::Pending,
            new_status: updated.status,
            reviewer_id,
            decided_at: updated.reviewed_at.unwrap_or_else(Utc::now),
        });

        Ok(updated)
    }

    pub async fn get(&self, tenant_id: u64, request_id: u64) -> Result<LeaveRequest> {
        self.store
            .get_request(tenant_id, request_id)
            .await?
            .ok_or_else(|| Error::not_found("Leave request not found"))
    }

    pub async fn list(
        &self,
        tenant_id: u64,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64)> {
        self.store.list_requests(tenant_id, filter).await
    }

    /// Balance summary for every active employee, creating defaults on
    /// first read.
    pub async fn balances(
        &self,
        tenant_id: u64,
        year: i32,
    ) -> Result<Vec<(Employee, LeaveBalance)>> {
        let employees = self.store.list_active_employees(tenant_id).await?;
        let mut out = Vec::with_capacity(employees.len());
        for employee in employees {
            let balance = self
                .store
                .get_or_create_balance(tenant_id, employee.id, year)
                .await?;
            out.push((employee, balance));
        }
        Ok(out)
    }

    /// Day-indexed month view of pending/approved requests.
    pub async fn calendar(
        &self,
        tenant_id: u64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<BTreeMap<String, Vec<CalendarEntry>>> {
        let (month_start, month_end) = calendar::month_bounds(year, month)?;
        let requests = self
            .store
            .requests_in_range(tenant_id, month_start, month_end)
            .await?;

        let names = self.employee_names(tenant_id).await?;
        let items: Vec<ProjectionInput> = requests
            .into_iter()
            .map(|request| {
                let employee_name = names
                    .get(&request.employee_id)
                    .cloned()
                    .unwrap_or_else(|| format!("employee {}", request.employee_id));
                ProjectionInput {
                    request,
                    employee_name,
                }
            })
            .collect();
        calendar::project_month(&items, year, month, today)
    }

    /// Flattened export rows for the admin CSV download.
    pub async fn export_rows(
        &self,
        tenant_id: u64,
        filter: &RequestFilter,
    ) -> Result<Vec<ExportRow>> {
        let unpaged = RequestFilter {
            page: None,
            per_page: None,
            ..filter.clone()
        };
        let (requests, _) = self.store.list_requests(tenant_id, &unpaged).await?;
        let names = self.employee_names(tenant_id).await?;

        let mut reviewer_names: HashMap<u64, Option<String>> = HashMap::new();
        let mut rows = Vec::with_capacity(requests.len());
        for request in &requests {
            let employee_name = names
                .get(&request.employee_id)
                .cloned()
                .unwrap_or_else(|| format!("employee {}", request.employee_id));
            let reviewer_name = match request.reviewer_id {
                Some(reviewer_id) => {
                    if !reviewer_names.contains_key(&reviewer_id) {
                        let name = self
                            .store
                            .user_display_name(tenant_id, reviewer_id)
                            .await?;
                        reviewer_names.insert(reviewer_id, name);
                    }
                    reviewer_names[&reviewer_id].clone()
                }
                None => None,
            };
            rows.push(export::build_row(
                request,
                &employee_name,
                reviewer_name.as_deref(),
            ));
        }
        Ok(rows)
    }

    async fn employee_names(&self, tenant_id: u64) -> Result<HashMap<u64, String>> {
        let employees = self.store.list_active_employees(tenant_id).await?;
        Ok(employees
            .into_iter()
            .map(|e| (e.id, e.display_name()))
            .collect())
    }
}

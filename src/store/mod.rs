//! Storage interface for leave requests and balances.
//!
//! Implementations must be thread-safe and uphold the two storage-level
//! contracts of the core: the review write (status transition + balance
//! mutation) is a single atomic unit, and balance creation is
//! create-on-conflict-fetch under the (employee, year) uniqueness key.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::employee::Employee;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Payload for a new PENDING request. The pending reservation on the
/// balance is applied in the same unit of work as the insert.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub tenant_id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_half: bool,
    pub end_half: bool,
    pub total_days: Decimal,
    pub total_hours: Option<Decimal>,
    pub reason: Option<String>,
}

/// Terminal transition recorded by `commit_review`. `status` is always
/// `Approved` or `Rejected`; the lifecycle manager never builds anything
/// else.
#[derive(Debug, Clone)]
pub struct ReviewDecision {
    pub status: LeaveStatus,
    pub reviewer_id: u64,
    pub reviewed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Filter for list/export reads. `per_page = None` returns everything.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    pub year: Option<i32>,
    pub employee_id: Option<u64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[async_trait]
pub trait LeaveStore: Send + Sync + 'static {
    /// Inserts a PENDING request and reserves its quantity on the
    /// employee's balance in one unit of work.
    async fn insert_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest>;

    async fn get_request(&self, tenant_id: u64, id: u64) -> Result<Option<LeaveRequest>>;

    /// Filtered page of requests plus the unpaginated total.
    async fn list_requests(
        &self,
        tenant_id: u64,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64)>;

    /// Pending and approved requests whose span overlaps the closed range,
    /// ordered by start date.
    async fn requests_in_range(
        &self,
        tenant_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequest>>;

    /// Atomically transitions a PENDING request to its terminal status and,
    /// on approval, applies the ledger mutation to the balance. Fails with
    /// NotFound for an unknown id or foreign tenant, Conflict when the
    /// request is no longer PENDING; either way nothing is written.
    async fn commit_review(
        &self,
        tenant_id: u64,
        request_id: u64,
        decision: ReviewDecision,
    ) -> Result<LeaveRequest>;

    /// Fetches the (employee, year) balance, creating it with the category
    /// defaults on first access. Concurrent first accesses converge on one
    /// record.
    async fn get_or_create_balance(
        &self,
        tenant_id: u64,
        employee_id: u64,
        year: i32,
    ) -> Result<LeaveBalance>;

    async fn get_employee(&self, tenant_id: u64, id: u64) -> Result<Option<Employee>>;

    async fn list_active_employees(&self, tenant_id: u64) -> Result<Vec<Employee>>;

    /// Display name of a reviewer's user account, if known.
    async fn user_display_name(&self, tenant_id: u64, user_id: u64) -> Result<Option<String>>;
}

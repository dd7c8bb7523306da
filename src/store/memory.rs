//! In-memory [`LeaveStore`] used by the test suite. A single mutex guards
//! the whole state so the review write (request + balance) is atomic the
//! same way the SQL backend's transaction is.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::leave::ledger;
use crate::model::employee::Employee;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::store::{LeaveStore, NewLeaveRequest, RequestFilter, ReviewDecision};

#[derive(Default)]
struct State {
    requests: HashMap<u64, LeaveRequest>,
    balances: HashMap<(u64, i32), LeaveBalance>,
    employees: HashMap<u64, Employee>,
    users: HashMap<u64, String>,
    next_request_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// When set, any write that would touch a balance fails before either
    /// record is modified. Lets tests observe the all-or-nothing contract.
    fail_balance_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_balance_writes(&self, fail: bool) {
        self.fail_balance_writes.store(fail, Ordering::SeqCst);
    }

    pub fn add_employee(&self, employee: Employee) {
        let mut state = self.state.lock().expect("store poisoned");
        if let Some(user_id) = employee.user_id {
            state
                .users
                .insert(user_id, employee.display_name());
        }
        state.employees.insert(employee.id, employee);
    }

    pub fn add_user(&self, user_id: u64, display_name: impl Into<String>) {
        let mut state = self.state.lock().expect("store poisoned");
        state.users.insert(user_id, display_name.into());
    }

    pub fn put_balance(&self, balance: LeaveBalance) {
        let mut state = self.state.lock().expect("store poisoned");
        state
            .balances
            .insert((balance.employee_id, balance.year), balance);
    }

    /// Snapshot for before/after assertions in tests.
    pub fn balance_snapshot(&self, employee_id: u64, year: i32) -> Option<LeaveBalance> {
        let state = self.state.lock().expect("store poisoned");
        state.balances.get(&(employee_id, year)).cloned()
    }

    fn balance_entry(
        state: &mut State,
        tenant_id: u64,
        employee_id: u64,
        year: i32,
    ) -> LeaveBalance {
        state
            .balances
            .entry((employee_id, year))
            .or_insert_with(|| LeaveBalance::with_defaults(tenant_id, employee_id, year))
            .clone()
    }

    fn matches(filter: &RequestFilter, request: &LeaveRequest) -> bool {
        use chrono::Datelike;
        filter.status.is_none_or(|s| request.status == s)
            && filter.leave_type.is_none_or(|t| request.leave_type == t)
            && filter.year.is_none_or(|y| request.start_date.year() == y)
            && filter.employee_id.is_none_or(|e| request.employee_id == e)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest> {
        let mut state = self.state.lock().expect("store poisoned");

        use chrono::Datelike;
        let year = new.start_date.year();
        let mut balance = Self::balance_entry(&mut state, new.tenant_id, new.employee_id, year);
        ledger::reserve_pending(&mut balance, new.leave_type, new.total_days)?;
        if self.fail_balance_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("injected balance write failure".into()));
        }

        state.next_request_id += 1;
        let request = LeaveRequest {
            id: state.next_request_id,
            tenant_id: new.tenant_id,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            start_half: new.start_half,
            end_half: new.end_half,
            total_days: new.total_days,
            total_hours: new.total_hours,
            status: LeaveStatus::Pending,
            reason: new.reason,
            requested_at: Utc::now(),
            reviewer_id: None,
            reviewed_at: None,
            review_notes: None,
        };
        state.balances.insert((balance.employee_id, balance.year), balance);
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_request(&self, tenant_id: u64, id: u64) -> Result<Option<LeaveRequest>> {
        let state = self.state.lock().expect("store poisoned");
        Ok(state
            .requests
            .get(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_requests(
        &self,
        tenant_id: u64,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64)> {
        let state = self.state.lock().expect("store poisoned");
        let mut rows: Vec<LeaveRequest> = state
            .requests
            .values()
            .filter(|r| r.tenant_id == tenant_id && Self::matches(filter, r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));

        let total = rows.len() as i64;
        if let Some(per_page) = filter.per_page {
            let page = filter.page.unwrap_or(1).max(1);
            let offset = ((page - 1) * per_page) as usize;
            rows = rows
                .into_iter()
                .skip(offset)
                .take(per_page as usize)
                .collect();
        }
        Ok((rows, total))
    }

    async fn requests_in_range(
        &self,
        tenant_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequest>> {
        let state = self.state.lock().expect("store poisoned");
        let mut rows: Vec<LeaveRequest> = state
            .requests
            .values()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && matches!(r.status, LeaveStatus::Pending | LeaveStatus::Approved)
                    && r.start_date <= to
                    && r.end_date >= from
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.start_date, r.id));
        Ok(rows)
    }

    async fn commit_review(
        &self,
        tenant_id: u64,
        request_id: u64,
        decision: ReviewDecision,
    ) -> Result<LeaveRequest> {
        let mut state = self.state.lock().expect("store poisoned");

        let current = state
            .requests
            .get(&request_id)
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Leave request not found"))?;
        if !current.is_pending() {
            return Err(Error::conflict("Leave request already processed"));
        }

        let mut updated = current;
        updated.status = decision.status;
        updated.reviewer_id = Some(decision.reviewer_id);
        updated.reviewed_at = Some(decision.reviewed_at);
        updated.review_notes = decision.notes;

        // Stage the balance effect before writing anything: a failure here
        // leaves both records exactly as they were.
        let staged_balance = if decision.status == LeaveStatus::Approved {
            let mut balance = Self::balance_entry(
                &mut state,
                tenant_id,
                updated.employee_id,
                updated.balance_year(),
            );
            ledger::apply_approval(&mut balance, updated.leave_type, updated.total_days)?;
            if self.fail_balance_writes.load(Ordering::SeqCst) {
                return Err(Error::Persistence("injected balance write failure".into()));
            }
            Some(balance)
        } else {
            None
        };

        if let Some(balance) = staged_balance {
            state
                .balances
                .insert((balance.employee_id, balance.year), balance);
        }
        state.requests.insert(request_id, updated.clone());
        Ok(updated)
    }

    async fn get_or_create_balance(
        &self,
        tenant_id: u64,
        employee_id: u64,
        year: i32,
    ) -> Result<LeaveBalance> {
        let mut state = self.state.lock().expect("store poisoned");
        Ok(Self::balance_entry(&mut state, tenant_id, employee_id, year))
    }

    async fn get_employee(&self, tenant_id: u64, id: u64) -> Result<Option<Employee>> {
        let state = self.state.lock().expect("store poisoned");
        Ok(state
            .employees
            .get(&id)
            .filter(|e| e.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_active_employees(&self, tenant_id: u64) -> Result<Vec<Employee>> {
        let state = self.state.lock().expect("store poisoned");
        let mut employees: Vec<Employee> = state
            .employees
            .values()
            .filter(|e| e.tenant_id == tenant_id && e.is_active())
            .cloned()
            .collect();
        employees.sort_by_key(|e| e.id);
        Ok(employees)
    }

    async fn user_display_name(&self, _tenant_id: u64, user_id: u64) -> Result<Option<String>> {
        let state = self.state.lock().expect("store poisoned");
        Ok(state.users.get(&user_id).cloned())
    }
}

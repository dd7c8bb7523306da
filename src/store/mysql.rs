//! MySQL [`LeaveStore`] backed by sqlx. All statements use the runtime
//! query API; enums travel as their storage strings and are parsed back at
//! the row boundary.
//!
//! Atomicity contract: `commit_review` locks the request row, re-checks the
//! PENDING precondition with a conditional UPDATE inside the transaction,
//! and writes the balance in the same transaction. Balance creation is
//! INSERT IGNORE followed by a fetch, so concurrent first accesses converge
//! on the single row guarded by the (employee_id, year) unique key.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use crate::error::{Error, Result};
use crate::leave::ledger;
use crate::model::employee::Employee;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::store::{LeaveStore, NewLeaveRequest, RequestFilter, ReviewDecision};

const REQUEST_COLUMNS: &str = "id, tenant_id, employee_id, leave_type, start_date, end_date, \
     start_half, end_half, total_days, total_hours, status, reason, requested_at, \
     reviewer_id, reviewed_at, review_notes";

const BALANCE_COLUMNS: &str = "tenant_id, employee_id, year, vacation_total, vacation_carry_over, \
     vacation_used, vacation_pending, rol_total, rol_used, rol_pending, ex_festivity_total, \
     ex_festivity_used, ex_festivity_pending, sick_days_used, law_104_used";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlStore { pool }
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    I32(i32),
    Str(String),
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    tenant_id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_half: bool,
    end_half: bool,
    total_days: Decimal,
    total_hours: Option<Decimal>,
    status: String,
    reason: Option<String>,
    requested_at: DateTime<Utc>,
    reviewer_id: Option<u64>,
    reviewed_at: Option<DateTime<Utc>>,
    review_notes: Option<String>,
}

impl TryFrom<RequestRow> for LeaveRequest {
    type Error = Error;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(LeaveRequest {
            id: row.id,
            tenant_id: row.tenant_id,
            employee_id: row.employee_id,
            leave_type: row
                .leave_type
                .parse()
                .map_err(|_| Error::Persistence(format!("bad leave_type '{}'", row.leave_type)))?,
            start_date: row.start_date,
            end_date: row.end_date,
            start_half: row.start_half,
            end_half: row.end_half,
            total_days: row.total_days,
            total_hours: row.total_hours,
            status: row
                .status
                .parse()
                .map_err(|_| Error::Persistence(format!("bad status '{}'", row.status)))?,
            reason: row.reason,
            requested_at: row.requested_at,
            reviewer_id: row.reviewer_id,
            reviewed_at: row.reviewed_at,
            review_notes: row.review_notes,
        })
    }
}

#[derive(FromRow)]
struct BalanceRow {
    tenant_id: u64,
    employee_id: u64,
    year: i32,
    vacation_total: Decimal,
    vacation_carry_over: Decimal,
    vacation_used: Decimal,
    vacation_pending: Decimal,
    rol_total: Decimal,
    rol_used: Decimal,
    rol_pending: Decimal,
    ex_festivity_total: Decimal,
    ex_festivity_used: Decimal,
    ex_festivity_pending: Decimal,
    sick_days_used: i64,
    law_104_used: Decimal,
}

impl From<BalanceRow> for LeaveBalance {
    fn from(row: BalanceRow) -> Self {
        LeaveBalance {
            tenant_id: row.tenant_id,
            employee_id: row.employee_id,
            year: row.year,
            vacation_total: row.vacation_total,
            vacation_carry_over: row.vacation_carry_over,
            vacation_used: row.vacation_used,
            vacation_pending: row.vacation_pending,
            rol_total: row.rol_total,
            rol_used: row.rol_used,
            rol_pending: row.rol_pending,
            ex_festivity_total: row.ex_festivity_total,
            ex_festivity_used: row.ex_festivity_used,
            ex_festivity_pending: row.ex_festivity_pending,
            sick_days_used: row.sick_days_used,
            law_104_used: row.law_104_used,
        }
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    tenant_id: u64,
    first_name: String,
    last_name: String,
    user_id: Option<u64>,
    status: String,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            tenant_id: row.tenant_id,
            first_name: row.first_name,
            last_name: row.last_name,
            user_id: row.user_id,
            status: row.status,
        }
    }
}

impl MySqlStore {
    /// Creates the balance row if absent, then locks and returns it. Must
    /// run inside the caller's transaction.
    async fn balance_for_update(
        tx: &mut Transaction<'_, MySql>,
        tenant_id: u64,
        employee_id: u64,
        year: i32,
    ) -> Result<LeaveBalance> {
        let defaults = LeaveBalance::with_defaults(tenant_id, employee_id, year);
        sqlx::query(&format!(
            "INSERT IGNORE INTO leave_balances ({BALANCE_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(defaults.tenant_id)
        .bind(defaults.employee_id)
        .bind(defaults.year)
        .bind(defaults.vacation_total)
        .bind(defaults.vacation_carry_over)
        .bind(defaults.vacation_used)
        .bind(defaults.vacation_pending)
        .bind(defaults.rol_total)
        .bind(defaults.rol_used)
        .bind(defaults.rol_pending)
        .bind(defaults.ex_festivity_total)
        .bind(defaults.ex_festivity_used)
        .bind(defaults.ex_festivity_pending)
        .bind(defaults.sick_days_used)
        .bind(defaults.law_104_used)
        .execute(&mut **tx)
        .await?;

        let row = sqlx::query_as::<_, BalanceRow>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances \
             WHERE employee_id = ? AND year = ? AND tenant_id = ? FOR UPDATE"
        ))
        .bind(employee_id)
        .bind(year)
        .bind(tenant_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.into())
    }

    async fn write_balance(
        tx: &mut Transaction<'_, MySql>,
        balance: &LeaveBalance,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE leave_balances SET \
               vacation_used = ?, vacation_pending = ?, \
               rol_used = ?, rol_pending = ?, \
               ex_festivity_used = ?, ex_festivity_pending = ?, \
               sick_days_used = ?, law_104_used = ? \
             WHERE employee_id = ? AND year = ? AND tenant_id = ?",
        )
        .bind(balance.vacation_used)
        .bind(balance.vacation_pending)
        .bind(balance.rol_used)
        .bind(balance.rol_pending)
        .bind(balance.ex_festivity_used)
        .bind(balance.ex_festivity_pending)
        .bind(balance.sick_days_used)
        .bind(balance.law_104_used)
        .bind(balance.employee_id)
        .bind(balance.year)
        .bind(balance.tenant_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn fetch_request(&self, tenant_id: u64, id: u64) -> Result<Option<LeaveRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ? AND tenant_id = ?"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(LeaveRequest::try_from).transpose()
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO leave_requests \
               (tenant_id, employee_id, leave_type, start_date, end_date, start_half, \
                end_half, total_days, total_hours, status, reason, requested_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
        )
        .bind(new.tenant_id)
        .bind(new.employee_id)
        .bind(new.leave_type.to_string())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.start_half)
        .bind(new.end_half)
        .bind(new.total_days)
        .bind(new.total_hours)
        .bind(&new.reason)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = new.employee_id, "Failed to insert leave request");
            Error::from(e)
        })?;
        let id = result.last_insert_id();

        let year = new.start_date.year();
        let mut balance =
            Self::balance_for_update(&mut tx, new.tenant_id, new.employee_id, year).await?;
        ledger::reserve_pending(&mut balance, new.leave_type, new.total_days)?;
        Self::write_balance(&mut tx, &balance).await?;

        tx.commit().await?;

        self.fetch_request(new.tenant_id, id)
            .await?
            .ok_or_else(|| Error::Persistence("inserted leave request vanished".into()))
    }

    async fn get_request(&self, tenant_id: u64, id: u64) -> Result<Option<LeaveRequest>> {
        self.fetch_request(tenant_id, id).await
    }

    async fn list_requests(
        &self,
        tenant_id: u64,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64)> {
        let mut where_sql = String::from(" WHERE tenant_id = ?");
        let mut args: Vec<FilterValue> = vec![FilterValue::U64(tenant_id)];

        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }
        if let Some(leave_type) = filter.leave_type {
            where_sql.push_str(" AND leave_type = ?");
            args.push(FilterValue::Str(leave_type.to_string()));
        }
        if let Some(year) = filter.year {
            where_sql.push_str(" AND YEAR(start_date) = ?");
            args.push(FilterValue::I32(year));
        }
        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::I32(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.clone()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to count leave requests");
            Error::from(e)
        })?;

        let mut data_sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests{} ORDER BY requested_at DESC, id DESC",
            where_sql
        );
        if filter.per_page.is_some() {
            data_sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut data_q = sqlx::query_as::<_, RequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::I32(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        if let Some(per_page) = filter.per_page {
            let page = filter.page.unwrap_or(1).max(1);
            data_q = data_q.bind(per_page).bind((page - 1) * per_page);
        }

        let rows = data_q.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave requests");
            Error::from(e)
        })?;
        let requests = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((requests, total))
    }

    async fn requests_in_range(
        &self,
        tenant_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE tenant_id = ? AND status IN ('pending', 'approved') \
               AND start_date <= ? AND end_date >= ? \
             ORDER BY start_date ASC, id ASC"
        ))
        .bind(tenant_id)
        .bind(to)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch calendar range");
            Error::from(e)
        })?;
        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn commit_review(
        &self,
        tenant_id: u64,
        request_id: u64,
        decision: ReviewDecision,
    ) -> Result<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE id = ? AND tenant_id = ? FOR UPDATE"
        ))
        .bind(request_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;
        let current: LeaveRequest = row
            .ok_or_else(|| Error::not_found("Leave request not found"))?
            .try_into()?;
        if !current.is_pending() {
            return Err(Error::conflict("Leave request already processed"));
        }

        // Conditional UPDATE re-checks PENDING inside the transaction; a
        // racing reviewer loses here with zero rows touched.
        let result = sqlx::query(
            "UPDATE leave_requests \
             SET status = ?, reviewer_id = ?, reviewed_at = ?, review_notes = ? \
             WHERE id = ? AND tenant_id = ? AND status = 'pending'",
        )
        .bind(decision.status.to_string())
        .bind(decision.reviewer_id)
        .bind(decision.reviewed_at)
        .bind(&decision.notes)
        .bind(request_id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id, "Review transition failed");
            Error::from(e)
        })?;
        if result.rows_affected() == 0 {
            return Err(Error::conflict("Leave request already processed"));
        }

        if decision.status == LeaveStatus::Approved {
            let mut balance = Self::balance_for_update(
                &mut tx,
                tenant_id,
                current.employee_id,
                current.balance_year(),
            )
            .await?;
            ledger::apply_approval(&mut balance, current.leave_type, current.total_days)?;
            Self::write_balance(&mut tx, &balance).await?;
        }

        tx.commit().await?;

        let mut updated = current;
        updated.status = decision.status;
        updated.reviewer_id = Some(decision.reviewer_id);
        updated.reviewed_at = Some(decision.reviewed_at);
        updated.review_notes = decision.notes;
        Ok(updated)
    }

    async fn get_or_create_balance(
        &self,
        tenant_id: u64,
        employee_id: u64,
        year: i32,
    ) -> Result<LeaveBalance> {
        let mut tx = self.pool.begin().await?;
        let balance = Self::balance_for_update(&mut tx, tenant_id, employee_id, year).await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn get_employee(&self, tenant_id: u64, id: u64) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, tenant_id, first_name, last_name, user_id, status \
             FROM employees WHERE id = ? AND tenant_id = ?",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employee::from))
    }

    async fn list_active_employees(&self, tenant_id: u64) -> Result<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, tenant_id, first_name, last_name, user_id, status \
             FROM employees WHERE tenant_id = ? AND status = 'active' \
             ORDER BY last_name, first_name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list employees");
            Error::from(e)
        })?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn user_display_name(&self, tenant_id: u64, user_id: u64) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT username FROM users WHERE id = ? AND tenant_id = ?",
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name)
    }
}

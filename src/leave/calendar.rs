//! Month projection of leave requests onto a day-indexed grid. Read-only;
//! never touches balances.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// A request paired with the display name the grid shows.
#[derive(Debug, Clone)]
pub struct ProjectionInput {
    pub request: LeaveRequest,
    pub employee_name: String,
}

/// One cell entry. Half-day markers appear only on the literal first/last
/// day of the request span, and only when set.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    #[serde(rename = "type")]
    pub leave_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_half: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_half: Option<bool>,
}

pub fn is_business_day(day: NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Business days in the closed range, weekends excluded.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if is_business_day(day) {
            count += 1;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    count
}

pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::validation("month must be between 1 and 12"))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    // succ of the last representable month would overflow; chrono's range
    // (year +/- ~262000) makes that unreachable for real input.
    let end = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| Error::validation("month out of range"))?;
    Ok((start, end))
}

/// Approved requests already underway read as `in_progress` on the grid;
/// the stored status is untouched.
fn display_status(request: &LeaveRequest, today: NaiveDate) -> String {
    if request.status == LeaveStatus::Approved && request.covers(today) {
        "in_progress".to_string()
    } else {
        request.status.to_string()
    }
}

/// Expands the given requests onto the month grid. Requests are processed
/// in start-date order; each contributes one entry per business day of its
/// own span that falls inside the month.
pub fn project_month(
    items: &[ProjectionInput],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<BTreeMap<String, Vec<CalendarEntry>>> {
    let (month_start, month_end) = month_bounds(year, month)?;

    let mut ordered: Vec<&ProjectionInput> = items.iter().collect();
    ordered.sort_by_key(|i| (i.request.start_date, i.request.id));

    let mut grid: BTreeMap<String, Vec<CalendarEntry>> = BTreeMap::new();
    for item in ordered {
        let request = &item.request;
        let status = display_status(request, today);

        let mut day = request.start_date;
        while day <= request.end_date {
            if day >= month_start && day <= month_end && is_business_day(day) {
                let start_half =
                    (day == request.start_date && request.start_half).then_some(true);
                let end_half = (day == request.end_date && request.end_half).then_some(true);
                grid.entry(day.format("%Y-%m-%d").to_string())
                    .or_default()
                    .push(CalendarEntry {
                        id: request.id,
                        employee_id: request.employee_id,
                        employee_name: item.employee_name.clone(),
                        leave_type: request.leave_type.to_string(),
                        status: status.clone(),
                        start_half,
                        end_half,
                    });
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::model::leave_request::LeaveType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(
        id: u64,
        start: NaiveDate,
        end: NaiveDate,
        status: LeaveStatus,
    ) -> ProjectionInput {
        ProjectionInput {
            request: LeaveRequest {
                id,
                tenant_id: 1,
                employee_id: 1000,
                leave_type: LeaveType::Vacation,
                start_date: start,
                end_date: end,
                start_half: false,
                end_half: false,
                total_days: dec!(1),
                total_hours: None,
                status,
                reason: None,
                requested_at: Utc::now(),
                reviewer_id: None,
                reviewed_at: None,
                review_notes: None,
            },
            employee_name: "John Doe".to_string(),
        }
    }

    #[test]
    fn weekends_are_excluded() {
        // Friday 2026-03-06 through Monday 2026-03-09
        let items = vec![request(1, date(2026, 3, 6), date(2026, 3, 9), LeaveStatus::Approved)];
        let grid = project_month(&items, 2026, 3, date(2026, 1, 1)).unwrap();

        assert!(grid.contains_key("2026-03-06"));
        assert!(grid.contains_key("2026-03-09"));
        assert!(!grid.contains_key("2026-03-07"));
        assert!(!grid.contains_key("2026-03-08"));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn half_day_flags_only_on_literal_boundary_days() {
        let mut item = request(1, date(2026, 3, 4), date(2026, 3, 6), LeaveStatus::Pending);
        item.request.start_half = true;
        let grid = project_month(&[item], 2026, 3, date(2026, 1, 1)).unwrap();

        let first = &grid["2026-03-04"][0];
        assert_eq!(first.start_half, Some(true));
        assert_eq!(first.end_half, None);

        let mid = &grid["2026-03-05"][0];
        assert_eq!(mid.start_half, None);
        assert_eq!(mid.end_half, None);

        // end_half is unset on the request, so the last day carries no flag
        let last = &grid["2026-03-06"][0];
        assert_eq!(last.start_half, None);
        assert_eq!(last.end_half, None);
    }

    #[test]
    fn spans_are_clipped_to_the_queried_month() {
        let items = vec![request(1, date(2026, 2, 25), date(2026, 3, 3), LeaveStatus::Approved)];
        let grid = project_month(&items, 2026, 3, date(2026, 1, 1)).unwrap();

        assert!(grid.keys().all(|k| k.starts_with("2026-03")));
        // 2026-03-01 is a Sunday
        assert!(grid.contains_key("2026-03-02"));
        assert!(grid.contains_key("2026-03-03"));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn approved_request_underway_reads_in_progress() {
        let items = vec![
            request(1, date(2026, 3, 4), date(2026, 3, 6), LeaveStatus::Approved),
            request(2, date(2026, 3, 10), date(2026, 3, 10), LeaveStatus::Approved),
            request(3, date(2026, 3, 5), date(2026, 3, 5), LeaveStatus::Pending),
        ];
        let grid = project_month(&items, 2026, 3, date(2026, 3, 5)).unwrap();

        assert_eq!(grid["2026-03-05"][0].status, "in_progress");
        assert_eq!(grid["2026-03-10"][0].status, "approved");
        assert_eq!(grid["2026-03-05"][1].status, "pending");
    }

    #[test]
    fn entries_follow_start_date_order() {
        let items = vec![
            request(9, date(2026, 3, 5), date(2026, 3, 5), LeaveStatus::Pending),
            request(3, date(2026, 3, 2), date(2026, 3, 5), LeaveStatus::Approved),
        ];
        let grid = project_month(&items, 2026, 3, date(2026, 1, 1)).unwrap();
        let day = &grid["2026-03-05"];
        assert_eq!(day[0].id, 3);
        assert_eq!(day[1].id, 9);
    }

    #[test]
    fn business_day_count_skips_weekends() {
        assert_eq!(business_days_between(date(2026, 3, 6), date(2026, 3, 9)), 2);
        assert_eq!(business_days_between(date(2026, 3, 2), date(2026, 3, 6)), 5);
        assert_eq!(business_days_between(date(2026, 3, 7), date(2026, 3, 8)), 0);
    }

    #[test]
    fn invalid_month_is_a_validation_error() {
        assert!(project_month(&[], 2026, 13, date(2026, 1, 1)).is_err());
        assert!(month_bounds(2026, 0).is_err());
    }

    #[test]
    fn december_bounds_cover_the_full_month() {
        let (start, end) = month_bounds(2026, 12).unwrap();
        assert_eq!(start, date(2026, 12, 1));
        assert_eq!(end, date(2026, 12, 31));
    }
}

//! Tabular export of leave requests. One row per request, no aggregation;
//! the HTTP layer serves the result as a CSV download.

use crate::model::leave_request::LeaveRequest;

const BOM: &str = "\u{feff}";
const HEADER: &str =
    "ID,Employee,Type,Start Date,End Date,Days,Hours,Status,Requested At,Reviewer,Reviewed At,Notes";

/// A flattened request ready for serialization.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub id: u64,
    pub employee_name: String,
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub total_days: String,
    pub total_hours: String,
    pub status: String,
    pub requested_at: String,
    pub reviewer_name: String,
    pub reviewed_at: String,
    pub notes: String,
}

pub fn build_row(
    request: &LeaveRequest,
    employee_name: &str,
    reviewer_name: Option<&str>,
) -> ExportRow {
    ExportRow {
        id: request.id,
        employee_name: employee_name.to_string(),
        leave_type: request.leave_type.to_string(),
        start_date: request.start_date.format("%d/%m/%Y").to_string(),
        end_date: request.end_date.format("%d/%m/%Y").to_string(),
        total_days: request.total_days.to_string(),
        total_hours: request
            .total_hours
            .map(|h| h.to_string())
            .unwrap_or_default(),
        status: request.status.to_string(),
        requested_at: request.requested_at.format("%d/%m/%Y %H:%M").to_string(),
        reviewer_name: reviewer_name.unwrap_or_default().to_string(),
        reviewed_at: request
            .reviewed_at
            .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_default(),
        notes: request.review_notes.clone().unwrap_or_default(),
    }
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Serializes rows to CSV, UTF-8 with BOM so spreadsheet imports pick up
/// the encoding.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::with_capacity(64 + rows.len() * 96);
    out.push_str(BOM);
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            row.id.to_string(),
            escape(&row.employee_name),
            row.leave_type.clone(),
            row.start_date.clone(),
            row.end_date.clone(),
            row.total_days.clone(),
            row.total_hours.clone(),
            row.status.clone(),
            row.requested_at.clone(),
            escape(&row.reviewer_name),
            row.reviewed_at.clone(),
            escape(&row.notes),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use crate::model::leave_request::{LeaveStatus, LeaveType};

    fn sample_request() -> LeaveRequest {
        LeaveRequest {
            id: 7,
            tenant_id: 1,
            employee_id: 1000,
            leave_type: LeaveType::Personal,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            start_half: false,
            end_half: false,
            total_days: dec!(2),
            total_hours: Some(dec!(16)),
            status: LeaveStatus::Approved,
            reason: None,
            requested_at: Utc.with_ymd_and_hms(2026, 2, 20, 9, 30, 0).unwrap(),
            reviewer_id: Some(2),
            reviewed_at: Some(Utc.with_ymd_and_hms(2026, 2, 21, 14, 0, 0).unwrap()),
            review_notes: Some("ok, covered".to_string()),
        }
    }

    #[test]
    fn output_starts_with_bom_and_header() {
        let csv = to_csv(&[]);
        assert!(csv.starts_with("\u{feff}ID,Employee,"));
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn dates_use_day_first_format() {
        let row = build_row(&sample_request(), "John Doe", Some("Jane Admin"));
        assert_eq!(row.start_date, "04/03/2026");
        assert_eq!(row.reviewed_at, "21/02/2026 14:00");
        assert_eq!(row.total_hours, "16");
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        let mut req = sample_request();
        req.review_notes = Some("needs \"HR\" sign-off, urgent".to_string());
        let row = build_row(&req, "Doe, John", None);
        let csv = to_csv(&[row]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.contains("\"Doe, John\""));
        assert!(line.ends_with("\"needs \"\"HR\"\" sign-off, urgent\""));
    }

    #[test]
    fn absent_reviewer_leaves_columns_empty() {
        let mut req = sample_request();
        req.reviewer_id = None;
        req.reviewed_at = None;
        req.review_notes = None;
        let row = build_row(&req, "John Doe", None);
        let csv = to_csv(&[row]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.ends_with(",,,"));
    }
}

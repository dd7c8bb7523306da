//! End-to-end lifecycle tests over the in-memory store: state machine
//! preconditions, exactly-once balance mutation, and the atomicity of the
//! review write.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use leavedesk::error::Error;
use leavedesk::events::{DecisionEvent, EventOutbox};
use leavedesk::leave::lifecycle::{LeaveService, SubmitLeave};
use leavedesk::model::employee::Employee;
use leavedesk::model::leave_request::{LeaveStatus, LeaveType, ReviewAction};
use leavedesk::store::{LeaveStore, MemoryStore, NewLeaveRequest};
use tokio::sync::mpsc::UnboundedReceiver;

const TENANT: u64 = 1;
const EMPLOYEE: u64 = 1000;
const REVIEWER: u64 = 2;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> (
    LeaveService,
    Arc<MemoryStore>,
    UnboundedReceiver<DecisionEvent>,
) {
    let store = Arc::new(MemoryStore::new());
    store.add_employee(Employee {
        id: EMPLOYEE,
        tenant_id: TENANT,
        first_name: "John".into(),
        last_name: "Doe".into(),
        user_id: Some(42),
        status: "active".into(),
    });
    let (outbox, rx) = EventOutbox::channel();
    let service = LeaveService::new(store.clone(), outbox);
    (service, store, rx)
}

fn vacation(start: NaiveDate, end: NaiveDate) -> SubmitLeave {
    SubmitLeave {
        leave_type: LeaveType::Vacation,
        start_date: start,
        end_date: end,
        start_half: false,
        end_half: false,
        reason: None,
    }
}

#[tokio::test]
async fn approval_then_rejection_scenario() {
    let (service, store, _rx) = setup();

    // 2026-07-06 is a Monday; three business days
    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();
    assert_eq!(request.status, LeaveStatus::Pending);
    assert_eq!(request.total_days, dec!(3));

    let balance = store.balance_snapshot(EMPLOYEE, 2026).unwrap();
    assert_eq!(balance.vacation_pending, dec!(3));

    let approved = service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.reviewer_id, Some(REVIEWER));
    assert!(approved.reviewed_at.is_some());

    let balance = store.balance_snapshot(EMPLOYEE, 2026).unwrap();
    assert_eq!(balance.vacation_used, dec!(3));
    assert_eq!(balance.vacation_pending, Decimal::ZERO);

    // second request, rejected with a reason; balance must not move
    let second = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 9), date(2026, 7, 10)))
        .await
        .unwrap();
    let rejected = service
        .review(
            TENANT,
            second.id,
            ReviewAction::Reject,
            Some("team coverage".into()),
            REVIEWER,
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, LeaveStatus::Rejected);
    assert_eq!(rejected.review_notes.as_deref(), Some("team coverage"));

    let balance = store.balance_snapshot(EMPLOYEE, 2026).unwrap();
    assert_eq!(balance.vacation_used, dec!(3));
}

#[tokio::test]
async fn second_review_conflicts_and_leaves_balance_untouched() {
    let (service, store, _rx) = setup();

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();
    service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();

    let before = store.balance_snapshot(EMPLOYEE, 2026).unwrap();

    let again = service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await;
    assert!(matches!(again, Err(Error::Conflict(_))));

    let flipped = service
        .review(
            TENANT,
            request.id,
            ReviewAction::Reject,
            Some("changed my mind".into()),
            REVIEWER,
        )
        .await;
    assert!(matches!(flipped, Err(Error::Conflict(_))));

    assert_eq!(store.balance_snapshot(EMPLOYEE, 2026).unwrap(), before);
}

#[tokio::test]
async fn rejection_without_reason_is_invalid_and_stays_pending() {
    let (service, _store, _rx) = setup();

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();

    let missing = service
        .review(TENANT, request.id, ReviewAction::Reject, None, REVIEWER)
        .await;
    assert!(matches!(missing, Err(Error::Validation(_))));

    let blank = service
        .review(
            TENANT,
            request.id,
            ReviewAction::Reject,
            Some("   ".into()),
            REVIEWER,
        )
        .await;
    assert!(matches!(blank, Err(Error::Validation(_))));

    let current = service.get(TENANT, request.id).await.unwrap();
    assert_eq!(current.status, LeaveStatus::Pending);
}

#[tokio::test]
async fn failed_balance_write_rolls_back_the_approval() {
    let (service, store, _rx) = setup();

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();
    let before = store.balance_snapshot(EMPLOYEE, 2026).unwrap();

    store.fail_balance_writes(true);
    let result = service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await;
    assert!(matches!(result, Err(Error::Persistence(_))));

    // no partial commit: still pending, balance untouched
    let current = service.get(TENANT, request.id).await.unwrap();
    assert_eq!(current.status, LeaveStatus::Pending);
    assert_eq!(store.balance_snapshot(EMPLOYEE, 2026).unwrap(), before);

    // and the request is still reviewable once storage recovers
    store.fail_balance_writes(false);
    let approved = service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
}

#[tokio::test]
async fn personal_days_land_on_the_rol_hour_ledger() {
    let (service, store, _rx) = setup();

    let request = service
        .submit(
            TENANT,
            EMPLOYEE,
            SubmitLeave {
                leave_type: LeaveType::Personal,
                start_date: date(2026, 7, 6),
                end_date: date(2026, 7, 7),
                start_half: false,
                end_half: false,
                reason: Some("family errand".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(request.total_hours, Some(dec!(16)));
    assert_eq!(
        store.balance_snapshot(EMPLOYEE, 2026).unwrap().rol_pending,
        dec!(16)
    );

    service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();

    let balance = store.balance_snapshot(EMPLOYEE, 2026).unwrap();
    assert_eq!(balance.rol_used, dec!(16));
    assert_eq!(balance.rol_pending, Decimal::ZERO);
}

#[tokio::test]
async fn sick_days_round_up_to_whole_days() {
    let (service, store, _rx) = setup();

    // inserted at the store level to carry a fractional day count
    let request = store
        .insert_request(NewLeaveRequest {
            tenant_id: TENANT,
            employee_id: EMPLOYEE,
            leave_type: LeaveType::Sick,
            start_date: date(2026, 7, 9),
            end_date: date(2026, 7, 10),
            start_half: false,
            end_half: true,
            total_days: dec!(1.5),
            total_hours: None,
            reason: None,
        })
        .await
        .unwrap();

    service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();
    assert_eq!(store.balance_snapshot(EMPLOYEE, 2026).unwrap().sick_days_used, 2);
}

#[tokio::test]
async fn half_day_flags_shrink_the_working_total() {
    let (service, _store, _rx) = setup();

    let request = service
        .submit(
            TENANT,
            EMPLOYEE,
            SubmitLeave {
                leave_type: LeaveType::Vacation,
                start_date: date(2026, 7, 6),
                end_date: date(2026, 7, 8),
                start_half: true,
                end_half: true,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(request.total_days, dec!(2));
    assert!(request.start_half);
    assert!(request.end_half);
}

#[tokio::test]
async fn overlapping_open_request_is_rejected() {
    let (service, _store, _rx) = setup();

    service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();
    let overlap = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 8), date(2026, 7, 9)))
        .await;
    assert!(matches!(overlap, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn weekend_only_range_has_no_working_time() {
    let (service, _store, _rx) = setup();

    // 2026-07-11/12 is a weekend
    let result = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 11), date(2026, 7, 12)))
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn foreign_tenant_sees_not_found() {
    let (service, _store, _rx) = setup();

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();

    let other_tenant = service
        .review(99, request.id, ReviewAction::Approve, None, REVIEWER)
        .await;
    assert!(matches!(other_tenant, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn concurrent_reviews_decide_exactly_once() {
    let (service, store, _rx) = setup();

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();

    let a = {
        let service = service.clone();
        let id = request.id;
        tokio::spawn(async move {
            service
                .review(TENANT, id, ReviewAction::Approve, None, REVIEWER)
                .await
        })
    };
    let b = {
        let service = service.clone();
        let id = request.id;
        tokio::spawn(async move {
            service
                .review(
                    TENANT,
                    id,
                    ReviewAction::Reject,
                    Some("coverage".into()),
                    REVIEWER,
                )
                .await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    // the winning decision's balance effect happened at most once
    let balance = store.balance_snapshot(EMPLOYEE, 2026).unwrap();
    assert!(balance.vacation_used == dec!(3) || balance.vacation_used == Decimal::ZERO);
}

#[tokio::test]
async fn concurrent_balance_creation_converges_on_one_record() {
    let (_service, store, _rx) = setup();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.get_or_create_balance(TENANT, EMPLOYEE, 2026).await
        }));
    }
    let mut balances = Vec::new();
    for handle in handles {
        balances.push(handle.await.unwrap().unwrap());
    }
    for balance in &balances {
        assert_eq!(balance, &balances[0]);
        assert_eq!(balance.vacation_total, dec!(26));
    }
}

#[tokio::test]
async fn balances_listing_creates_defaults_on_first_read() {
    let (service, _store, _rx) = setup();

    let rows = service.balances(TENANT, 2026).await.unwrap();
    assert_eq!(rows.len(), 1);
    let (employee, balance) = &rows[0];
    assert_eq!(employee.id, EMPLOYEE);
    assert_eq!(balance.vacation_total, dec!(26));
    assert_eq!(balance.rol_total, dec!(56));
    assert_eq!(balance.ex_festivity_total, dec!(32));
}

#[tokio::test]
async fn calendar_reflects_committed_decisions() {
    let (service, _store, _rx) = setup();

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 10), date(2026, 7, 13)))
        .await
        .unwrap();
    service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();

    // Friday through Monday: weekend days never appear
    let grid = service
        .calendar(TENANT, 2026, 7, date(2026, 1, 1))
        .await
        .unwrap();
    assert!(grid.contains_key("2026-07-10"));
    assert!(grid.contains_key("2026-07-13"));
    assert!(!grid.contains_key("2026-07-11"));
    assert!(!grid.contains_key("2026-07-12"));

    let entry = &grid["2026-07-10"][0];
    assert_eq!(entry.employee_name, "John Doe");
    assert_eq!(entry.status, "approved");
}

#[tokio::test]
async fn export_rows_carry_reviewer_and_day_first_dates() {
    let (service, store, _rx) = setup();
    store.add_user(REVIEWER, "Jane Admin");

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();
    service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();

    let rows = service
        .export_rows(TENANT, &Default::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].employee_name, "John Doe");
    assert_eq!(rows[0].reviewer_name, "Jane Admin");
    assert_eq!(rows[0].start_date, "06/07/2026");
    assert_eq!(rows[0].status, "approved");
}

#[tokio::test]
async fn decisions_are_published_to_the_outbox() {
    let (service, _store, mut rx) = setup();

    let request = service
        .submit(TENANT, EMPLOYEE, vacation(date(2026, 7, 6), date(2026, 7, 8)))
        .await
        .unwrap();
    service
        .review(TENANT, request.id, ReviewAction::Approve, None, REVIEWER)
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.request_id, request.id);
    assert_eq!(event.old_status, LeaveStatus::Pending);
    assert_eq!(event.new_status, LeaveStatus::Approved);
    assert_eq!(event.notify_user_id, Some(42));
    assert!(!event.event_id.is_empty());
}

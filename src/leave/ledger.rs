//! Entitlement arithmetic. Pure functions over a [`LeaveBalance`]; the
//! store layer is responsible for running them inside its transaction.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{Error, Result};
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::LeaveType;

/// Fixed conversion for hour-denominated categories.
fn to_hours(days: Decimal) -> Decimal {
    days * Decimal::from(8)
}

/// Pending reduction clamps at zero: a balance initialized after the
/// reservation was recorded elsewhere must not be driven negative.
fn drain_pending(pending: &mut Decimal, amount: Decimal) {
    *pending = (*pending - amount).max(Decimal::ZERO);
}

fn ensure_positive(total_days: Decimal) -> Result<()> {
    if total_days <= Decimal::ZERO {
        return Err(Error::validation("total days must be greater than zero"));
    }
    Ok(())
}

/// Moves an approved request's quantity from pending to used on the balance
/// for its category. No authorization or state checks happen here; the
/// lifecycle manager owns those.
pub fn apply_approval(
    balance: &mut LeaveBalance,
    leave_type: LeaveType,
    total_days: Decimal,
) -> Result<()> {
    ensure_positive(total_days)?;

    match leave_type {
        LeaveType::Vacation => {
            balance.vacation_used += total_days;
            drain_pending(&mut balance.vacation_pending, total_days);
        }
        LeaveType::Personal | LeaveType::Rol => {
            let hours = to_hours(total_days);
            balance.rol_used += hours;
            drain_pending(&mut balance.rol_pending, hours);
        }
        LeaveType::ExFestivity => {
            let hours = to_hours(total_days);
            balance.ex_festivity_used += hours;
            drain_pending(&mut balance.ex_festivity_pending, hours);
        }
        LeaveType::Sick => {
            // Sick leave is tracked in whole days; partial days round up.
            let whole = total_days.ceil().to_i64().ok_or_else(|| {
                Error::validation("total days out of range for sick leave")
            })?;
            balance.sick_days_used += whole;
        }
        LeaveType::Law104 => {
            balance.law_104_used += total_days;
        }
    }
    Ok(())
}

/// Reserves a newly submitted request's quantity in the pending column of
/// its category. Sick and law-104 leave carry no pending field.
pub fn reserve_pending(
    balance: &mut LeaveBalance,
    leave_type: LeaveType,
    total_days: Decimal,
) -> Result<()> {
    ensure_positive(total_days)?;

    match leave_type {
        LeaveType::Vacation => balance.vacation_pending += total_days,
        LeaveType::Personal | LeaveType::Rol => balance.rol_pending += to_hours(total_days),
        LeaveType::ExFestivity => balance.ex_festivity_pending += to_hours(total_days),
        LeaveType::Sick | LeaveType::Law104 => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balance() -> LeaveBalance {
        LeaveBalance::with_defaults(1, 1000, 2026)
    }

    #[test]
    fn vacation_approval_moves_pending_to_used() {
        let mut b = balance();
        b.vacation_pending = dec!(3);
        apply_approval(&mut b, LeaveType::Vacation, dec!(3)).unwrap();
        assert_eq!(b.vacation_used, dec!(3));
        assert_eq!(b.vacation_pending, Decimal::ZERO);
    }

    #[test]
    fn personal_days_convert_to_rol_hours() {
        let mut b = balance();
        b.rol_pending = dec!(20);
        apply_approval(&mut b, LeaveType::Personal, dec!(2)).unwrap();
        assert_eq!(b.rol_used, dec!(16));
        assert_eq!(b.rol_pending, dec!(4));
    }

    #[test]
    fn pending_reduction_clamps_at_zero() {
        let mut b = balance();
        b.rol_pending = dec!(5);
        apply_approval(&mut b, LeaveType::Rol, dec!(2)).unwrap();
        assert_eq!(b.rol_used, dec!(16));
        assert_eq!(b.rol_pending, Decimal::ZERO);
    }

    #[test]
    fn ex_festivity_uses_its_own_hour_fields() {
        let mut b = balance();
        b.ex_festivity_pending = dec!(8);
        apply_approval(&mut b, LeaveType::ExFestivity, dec!(0.5)).unwrap();
        assert_eq!(b.ex_festivity_used, dec!(4));
        assert_eq!(b.ex_festivity_pending, dec!(4));
        assert_eq!(b.rol_used, Decimal::ZERO);
    }

    #[test]
    fn sick_partial_days_round_up() {
        let mut b = balance();
        apply_approval(&mut b, LeaveType::Sick, dec!(1.5)).unwrap();
        assert_eq!(b.sick_days_used, 2);
    }

    #[test]
    fn law_104_accrues_days_without_pending() {
        let mut b = balance();
        apply_approval(&mut b, LeaveType::Law104, dec!(1)).unwrap();
        assert_eq!(b.law_104_used, dec!(1));
    }

    #[test]
    fn non_positive_days_are_rejected() {
        let mut b = balance();
        assert!(apply_approval(&mut b, LeaveType::Vacation, Decimal::ZERO).is_err());
        assert!(apply_approval(&mut b, LeaveType::Vacation, dec!(-1)).is_err());
        assert!(reserve_pending(&mut b, LeaveType::Rol, Decimal::ZERO).is_err());
        assert_eq!(b, balance());
    }

    #[test]
    fn reservation_tracks_category_units() {
        let mut b = balance();
        reserve_pending(&mut b, LeaveType::Vacation, dec!(2.5)).unwrap();
        reserve_pending(&mut b, LeaveType::Personal, dec!(1)).unwrap();
        reserve_pending(&mut b, LeaveType::Sick, dec!(2)).unwrap();
        assert_eq!(b.vacation_pending, dec!(2.5));
        assert_eq!(b.rol_pending, dec!(8));
        assert_eq!(b.sick_days_used, 0);
    }

    #[test]
    fn repeated_half_day_approvals_do_not_drift() {
        let mut b = balance();
        for _ in 0..7 {
            apply_approval(&mut b, LeaveType::Vacation, dec!(0.5)).unwrap();
        }
        assert_eq!(b.vacation_used, dec!(3.5));
    }
}

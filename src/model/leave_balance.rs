use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-employee, per-calendar-year entitlement record. One row per
/// (employee, year), tenant-scoped, lazily created with the contractual
/// defaults on first access.
///
/// Vacation is counted in days; ROL/personal and ex-festivity permits in
/// hours; sick leave in whole days with no entitlement cap; law-104 leave in
/// days, uncapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub tenant_id: u64,
    pub employee_id: u64,
    pub year: i32,

    pub vacation_total: Decimal,
    pub vacation_carry_over: Decimal,
    pub vacation_used: Decimal,
    pub vacation_pending: Decimal,

    pub rol_total: Decimal,
    pub rol_used: Decimal,
    pub rol_pending: Decimal,

    pub ex_festivity_total: Decimal,
    pub ex_festivity_used: Decimal,
    pub ex_festivity_pending: Decimal,

    pub sick_days_used: i64,

    pub law_104_used: Decimal,
}

impl LeaveBalance {
    /// Annual defaults: 26 vacation days, 56 ROL hours, 32 ex-festivity
    /// hours, zero usage everywhere.
    pub fn with_defaults(tenant_id: u64, employee_id: u64, year: i32) -> Self {
        LeaveBalance {
            tenant_id,
            employee_id,
            year,
            vacation_total: Decimal::from(26),
            vacation_carry_over: Decimal::ZERO,
            vacation_used: Decimal::ZERO,
            vacation_pending: Decimal::ZERO,
            rol_total: Decimal::from(56),
            rol_used: Decimal::ZERO,
            rol_pending: Decimal::ZERO,
            ex_festivity_total: Decimal::from(32),
            ex_festivity_used: Decimal::ZERO,
            ex_festivity_pending: Decimal::ZERO,
            sick_days_used: 0,
            law_104_used: Decimal::ZERO,
        }
    }

    /// May go negative as a reporting artifact; never clamped here.
    pub fn vacation_remaining(&self) -> Decimal {
        self.vacation_total + self.vacation_carry_over - self.vacation_used - self.vacation_pending
    }

    pub fn rol_remaining(&self) -> Decimal {
        self.rol_total - self.rol_used - self.rol_pending
    }

    pub fn ex_festivity_remaining(&self) -> Decimal {
        self.ex_festivity_total - self.ex_festivity_used - self.ex_festivity_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_annual_entitlements() {
        let b = LeaveBalance::with_defaults(1, 1000, 2026);
        assert_eq!(b.vacation_total, dec!(26));
        assert_eq!(b.rol_total, dec!(56));
        assert_eq!(b.ex_festivity_total, dec!(32));
        assert_eq!(b.vacation_used, Decimal::ZERO);
        assert_eq!(b.sick_days_used, 0);
    }

    #[test]
    fn remaining_reports_negative_instead_of_clamping() {
        let mut b = LeaveBalance::with_defaults(1, 1000, 2026);
        b.vacation_used = dec!(30);
        assert_eq!(b.vacation_remaining(), dec!(-4));
    }
}

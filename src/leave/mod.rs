pub mod calendar;
pub mod export;
pub mod ledger;
pub mod lifecycle;

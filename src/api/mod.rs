pub mod balance;
pub mod calendar;
pub mod export;
pub mod leave_request;

use crate::leave::lifecycle::LeaveService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: LeaveService,
}

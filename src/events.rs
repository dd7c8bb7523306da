//! Decision fan-out. Review outcomes are published onto an in-process
//! outbox channel after the authoritative transaction commits; a drain task
//! forwards them to the notification and audit collaborators. A slow or
//! failing downstream can therefore never block or roll back a review.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::model::leave_request::LeaveStatus;

/// One review decision, as seen by downstream consumers.
#[derive(Debug, Clone)]
pub struct DecisionEvent {
    pub event_id: String,
    pub tenant_id: u64,
    pub request_id: u64,
    pub employee_id: u64,
    /// User account to notify; absent when the employee has none.
    pub notify_user_id: Option<u64>,
    pub old_status: LeaveStatus,
    pub new_status: LeaveStatus,
    pub reviewer_id: u64,
    pub decided_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify_decision(&self, event: &DecisionEvent) -> Result<(), String>;
}

#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn record_transition(&self, event: &DecisionEvent) -> Result<(), String>;
}

/// Default sinks: delivery itself belongs to the platform's notification
/// and audit services, so these just leave a trace.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify_decision(&self, event: &DecisionEvent) -> Result<(), String> {
        tracing::info!(
            request_id = event.request_id,
            user_id = ?event.notify_user_id,
            status = %event.new_status,
            "leave decision notification"
        );
        Ok(())
    }
}

pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record_transition(&self, event: &DecisionEvent) -> Result<(), String> {
        tracing::info!(
            event_id = %event.event_id,
            request_id = event.request_id,
            reviewer_id = event.reviewer_id,
            old = %event.old_status,
            new = %event.new_status,
            "leave status transition"
        );
        Ok(())
    }
}

/// Sending half of the outbox. Publishing never fails the caller; a closed
/// channel is logged and dropped.
#[derive(Clone)]
pub struct EventOutbox {
    tx: mpsc::UnboundedSender<DecisionEvent>,
}

impl EventOutbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DecisionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventOutbox { tx }, rx)
    }

    pub fn publish(&self, mut event: DecisionEvent) {
        event.event_id = Uuid::new_v4().to_string();
        if self.tx.send(event).is_err() {
            tracing::warn!("decision outbox closed, event dropped");
        }
    }
}

/// Drains the outbox until every sender is gone. Sink failures are surfaced
/// to observability only; the decision has already committed.
pub async fn drain(
    mut rx: mpsc::UnboundedReceiver<DecisionEvent>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
) {
    while let Some(event) = rx.recv().await {
        if event.notify_user_id.is_some() {
            if let Err(e) = notifier.notify_decision(&event).await {
                tracing::warn!(error = %e, request_id = event.request_id, "notification failed");
            }
        }
        if let Err(e) = audit.record_transition(&event).await {
            tracing::warn!(error = %e, request_id = event.request_id, "audit write failed");
        }
    }
}

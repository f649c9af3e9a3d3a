//! Credit ledger reconciliation
//!
//! The authoritative balance lives in the remote ledger; the client keeps a
//! best-effort mirror. When a billable event completes, the billing service
//! reports its cost and the displayed balance is deducted optimistically,
//! scoped to a watch channel so only balance displays observe the change.
//! A billing failure is absorbed: the triggering action already committed
//! server-side, so the balance simply stays stale until the next
//! authoritative refresh, which always replaces the displayed value with
//! the recomputed sum rather than merging.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::billing::{BillingApi, UserProfile};
use crate::api::ApiError;

/// A completed billable event, priced server-side
///
/// One variant per pricing endpoint; the trace/tool bodies are opaque to
/// the client and passed through as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageEvent {
    /// An agent tool invocation finished
    AgentTool {
        response_item: Value,
        tools: Value,
        usage: Value,
        mode: String,
    },
    /// A workflow execution finished, with its full trace
    WorkflowRun { tracing: Value },
    /// Knowledge-base usage
    Knowledge {
        usage: Value,
        reason: String,
        source: String,
    },
}

impl UsageEvent {
    /// Pricing endpoint suffix for this event kind
    pub fn kind(&self) -> &'static str {
        match self {
            UsageEvent::AgentTool { .. } => "agent",
            UsageEvent::WorkflowRun { .. } => "workflow",
            UsageEvent::Knowledge { .. } => "knowledge",
        }
    }
}

/// Round to two decimals, the ledger's display precision
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The client-side credit ledger
pub struct CreditLedger {
    billing: Arc<dyn BillingApi>,
    displayed: watch::Sender<f64>,
}

impl CreditLedger {
    pub fn new(billing: Arc<dyn BillingApi>) -> Self {
        let (displayed, _) = watch::channel(0.0);
        Self { billing, displayed }
    }

    /// Subscribe a balance display; nothing else needs to re-render when
    /// the balance moves
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.displayed.subscribe()
    }

    /// The balance currently shown, which may be stale relative to the
    /// server between refreshes
    pub fn displayed_balance(&self) -> f64 {
        *self.displayed.borrow()
    }

    /// Price a completed event and deduct its cost optimistically
    ///
    /// Returns the cost when billing succeeded. A failure is logged and
    /// absorbed (no retry, no balance change): the action that produced
    /// the event has already committed server-side.
    pub async fn record_usage(&self, event: UsageEvent) -> Option<f64> {
        match self.billing.usage_cost(&event).await {
            Ok(cost) => {
                let balance = round2(self.displayed_balance() - cost);
                self.displayed.send_replace(balance);
                debug!(kind = event.kind(), cost, balance, "usage billed");
                Some(cost)
            }
            Err(err) => {
                warn!("billing failed for {} event: {err}", event.kind());
                None
            }
        }
    }

    /// Authoritative refresh: re-fetch the profile and replace the
    /// displayed balance with the recomputed component sum, discarding any
    /// accumulated local deduction
    pub async fn refresh(&self) -> Result<UserProfile, ApiError> {
        let profile = self.billing.fetch_profile().await?;
        self.displayed.send_replace(profile.balance());
        Ok(profile)
    }
}

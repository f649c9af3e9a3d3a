//! Billing API - the external credit ledger service
//!
//! Lives on its own host and authenticates with the session collaborator's
//! bearer credential. Usage events are priced server-side; the client only
//! ever sees the resulting total cost. The profile read is the authoritative
//! source for the credit balance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{ensure_success, http_client, normalize_base_url, ApiError};
use crate::ledger::{round2, UsageEvent};
use crate::session::SessionProvider;

/// The authoritative billing profile for the current user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub subscription_credits: f64,

    #[serde(default)]
    pub extra_credits: f64,

    #[serde(default)]
    pub subscription_purchased_credits: f64,
}

impl UserProfile {
    /// The balance is always recomputed from the three additive components,
    /// never read from a stored total
    pub fn balance(&self) -> f64 {
        round2(self.subscription_credits + self.extra_credits + self.subscription_purchased_credits)
    }
}

/// The billing backend
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Price a completed usage event, returning its total credit cost
    async fn usage_cost(&self, event: &UsageEvent) -> Result<f64, ApiError>;

    /// Fetch the authoritative billing profile
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError>;
}

/// HTTP implementation of [`BillingApi`]
pub struct HttpBillingApi {
    client: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl HttpBillingApi {
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client()?,
            base_url: normalize_base_url(base_url),
            session,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentPricingBody<'a> {
    response_item: &'a Value,
    agent_tools: &'a Value,
    agent_usage: &'a Value,
    agent_mod: &'a str,
}

#[derive(Debug, Serialize)]
struct WorkflowPricingBody<'a> {
    tracing: &'a Value,
}

#[derive(Debug, Serialize)]
struct KnowledgePricingBody<'a> {
    usage: &'a Value,
    reason: &'a str,
    source: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingResponse {
    total_credit_cost: f64,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(default)]
    data: Option<UserProfile>,
}

#[async_trait]
impl BillingApi for HttpBillingApi {
    async fn usage_cost(&self, event: &UsageEvent) -> Result<f64, ApiError> {
        let url = format!("{}/api/external/pricing/{}", self.base_url, event.kind());
        let token = self.session.bearer_token().await?;
        let request = self.client.post(&url).bearer_auth(token);

        let request = match event {
            UsageEvent::AgentTool {
                response_item,
                tools,
                usage,
                mode,
            } => request.json(&AgentPricingBody {
                response_item,
                agent_tools: tools,
                agent_usage: usage,
                agent_mod: mode,
            }),
            UsageEvent::WorkflowRun { tracing } => request.json(&WorkflowPricingBody { tracing }),
            UsageEvent::Knowledge {
                usage,
                reason,
                source,
            } => request.json(&KnowledgePricingBody {
                usage,
                reason,
                source,
            }),
        };

        let response = ensure_success(request.send().await?).await?;
        let pricing: PricingResponse = response.json().await?;
        Ok(pricing.total_credit_cost)
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let url = format!("{}/api/external/user", self.base_url);
        let token = self.session.bearer_token().await?;
        let response = ensure_success(self.client.get(&url).bearer_auth(token).send().await?).await?;

        let envelope: ProfileEnvelope = response.json().await?;
        envelope.data.ok_or_else(|| ApiError::Protocol {
            endpoint: "/api/external/user".to_string(),
            message: "profile payload missing".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_balance_sums_components() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u-1",
            "subscriptionCredits": 10.0,
            "extraCredits": 2.5,
            "subscriptionPurchasedCredits": 0.0,
        }))
        .unwrap();
        assert_eq!(profile.balance(), 12.5);
    }

    #[test]
    fn test_profile_missing_components_default_to_zero() {
        let profile: UserProfile = serde_json::from_value(json!({ "id": "u-1" })).unwrap();
        assert_eq!(profile.balance(), 0.0);
    }

    #[test]
    fn test_agent_body_uses_remote_field_names() {
        let item = json!({"id": 1});
        let tools = json!([]);
        let usage = json!({"tokens": 42});
        let body = AgentPricingBody {
            response_item: &item,
            agent_tools: &tools,
            agent_usage: &usage,
            agent_mod: "agent-chat",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("responseItem").is_some());
        assert!(value.get("agentTools").is_some());
        assert!(value.get("agentUsage").is_some());
        assert_eq!(value["agentMod"], "agent-chat");
    }

    #[test]
    fn test_pricing_response_decodes() {
        let pricing: PricingResponse =
            serde_json::from_value(json!({ "totalCreditCost": 2.0 })).unwrap();
        assert_eq!(pricing.total_credit_cost, 2.0);
    }
}

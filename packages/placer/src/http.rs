use std::collections::HashMap;

use reqwest::Client;
use tracing::warn;

use crate::{CallAttempt, PlaceOutcome, Placer, PlacerError};

/// Connection details for a real telephony provider. Never wired to an
/// actual vendor by the core — real integration is explicitly out of
/// scope (spec.md §1) — but shaped the way `twilio-rs`'s
/// `TwilioOptions`/`TwilioService` pair a client against its
/// credentials, for whichever deployment supplies a concrete provider.
#[derive(Debug, Clone)]
pub struct HttpPlacerConfig {
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
}

#[derive(Debug, Clone)]
pub struct HttpPlacer {
    config: HttpPlacerConfig,
    client: Client,
}

impl HttpPlacer {
    pub fn new(config: HttpPlacerConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Placer for HttpPlacer {
    async fn place(&self, attempt: &CallAttempt) -> Result<PlaceOutcome, PlacerError> {
        let url = format!("{}/Calls", self.config.base_url);

        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", &attempt.dialed_number);
        form_body.insert("CallSid", &attempt.external_call_id);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form_body)
            .send()
            .await
            .map_err(|e| PlacerError::Request(e.to_string()))?;

        if response.status().is_success() {
            Ok(PlaceOutcome::Succeeded)
        } else {
            warn!(status = %response.status(), "placer provider returned a non-success status");
            Ok(PlaceOutcome::Failed)
        }
    }
}

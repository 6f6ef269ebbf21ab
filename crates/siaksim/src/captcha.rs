//! Cloudflare Turnstile verification.
//!
//! Humans must pass a Turnstile challenge before a plan submission counts;
//! bot sessions never see the widget and skip verification entirely.

use serde::Deserialize;
use siaksim_common::PortalError;
use tracing::debug;

use crate::config::CaptchaConfig;

/// Remote CAPTCHA verifier, or a pass-through when no secret is
/// configured (local development and tests).
#[derive(Clone)]
pub enum CaptchaVerifier {
    Turnstile {
        http: reqwest::Client,
        secret: String,
        url: String,
    },
    Disabled,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl CaptchaVerifier {
    pub fn from_config(config: &CaptchaConfig) -> Self {
        if config.secret_key.is_empty() {
            tracing::warn!("no CAPTCHA secret configured, verification disabled");
            return Self::Disabled;
        }
        Self::Turnstile {
            http: reqwest::Client::new(),
            secret: config.secret_key.clone(),
            url: config.verify_url.clone(),
        }
    }

    /// Check a `cf-turnstile-response` token against siteverify.
    pub async fn verify(&self, token: &str, remote_ip: &str) -> Result<(), PortalError> {
        let Self::Turnstile { http, secret, url } = self else {
            return Ok(());
        };

        let body = serde_json::json!({
            "secret": secret,
            "response": token,
            "remoteip": remote_ip,
        });

        let response: SiteverifyResponse = http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortalError::Internal(format!("siteverify request failed: {e}")))?
            .json()
            .await
            .map_err(|e| PortalError::Internal(format!("siteverify bad response: {e}")))?;

        if response.success {
            debug!(remote_ip, "CAPTCHA verified");
            Ok(())
        } else {
            Err(PortalError::CaptchaRejected(
                response.error_codes.join(", "),
            ))
        }
    }
}

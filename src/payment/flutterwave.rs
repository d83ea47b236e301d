//! Flutterwave client: hosted payment-link initiation.
//!
//! The correlation id for Flutterwave is our own reference, passed as
//! `tx_ref` and echoed back on the redirect callback.

use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::ProviderError;
use crate::config::FlutterwaveConfig;

pub struct FlutterwaveClient<'a> {
    http: &'a reqwest::Client,
    config: &'a FlutterwaveConfig,
}

#[derive(Debug)]
pub struct PaymentLink {
    pub link: String,
    pub payload: Value,
}

impl<'a> FlutterwaveClient<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a FlutterwaveConfig) -> Self {
        Self { http, config }
    }

    pub async fn create_payment_link(
        &self,
        email: &str,
        amount: &Decimal,
        currency: &str,
        tx_ref: &str,
    ) -> Result<PaymentLink, ProviderError> {
        let body = json!({
            "tx_ref": tx_ref,
            "amount": amount.to_string(),
            "currency": currency,
            "redirect_url": self.config.redirect_url,
            "customer": { "email": email },
            "customizations": {
                "title": "Seekon Apparel",
                "description": "Order payment",
            },
        });

        let response = self
            .http
            .post(format!("{}/v3/payments", self.config.base_url))
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;

        let accepted = status.is_success()
            && payload.get("status").and_then(Value::as_str) == Some("success");
        if !accepted {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("payment link creation failed")
                .to_string();
            return Err(ProviderError::Rejected { message, payload });
        }

        let link = payload
            .pointer("/data/link")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Rejected {
                message: "response missing payment link".to_string(),
                payload: payload.clone(),
            })?;

        Ok(PaymentLink { link, payload })
    }
}

/// Redirect-callback statuses Flutterwave reports for a settled payment.
pub fn is_successful_status(status: &str) -> bool {
    matches!(status, "successful" | "completed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_statuses_are_recognized() {
        assert!(is_successful_status("successful"));
        assert!(is_successful_status("completed"));
        assert!(!is_successful_status("cancelled"));
        assert!(!is_successful_status("failed"));
        assert!(!is_successful_status(""));
    }
}

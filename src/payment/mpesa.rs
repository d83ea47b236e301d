//! M-Pesa Daraja client: OAuth client-credentials exchange and STK push.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use super::ProviderError;
use crate::config::MpesaConfig;
use crate::domain::PhoneNumber;

pub struct MpesaClient<'a> {
    http: &'a reqwest::Client,
    config: &'a MpesaConfig,
}

/// Accepted STK push: the customer's phone has been prompted and the
/// checkout request id correlates the eventual callback.
#[derive(Debug)]
pub struct StkPush {
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    pub customer_message: Option<String>,
    pub payload: Value,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl<'a> MpesaClient<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a MpesaConfig) -> Self {
        Self { http, config }
    }

    /// Daraja timestamp format: `YYYYMMDDHHMMSS`.
    pub fn daraja_timestamp(now: DateTime<Utc>) -> String {
        now.format("%Y%m%d%H%M%S").to_string()
    }

    /// STK push password: base64(shortcode + passkey + timestamp).
    pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
        STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
    }

    /// OAuth client-credentials exchange. The token is used for a single
    /// STK push and not cached.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let url = format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.config.base_url
        );
        let token: TokenResponse = self
            .http
            .get(&url)
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(token.access_token)
    }

    pub async fn stk_push(
        &self,
        phone: &PhoneNumber,
        amount: &Decimal,
        reference: &str,
    ) -> Result<StkPush, ProviderError> {
        let token = self.access_token().await?;
        let timestamp = Self::daraja_timestamp(Utc::now());
        let password =
            Self::stk_password(&self.config.shortcode, &self.config.passkey, &timestamp);

        // Daraja takes whole currency units.
        let whole_amount = amount.round().to_i64().ok_or_else(|| {
            ProviderError::Rejected {
                message: "amount out of range".to_string(),
                payload: json!({ "error": "amount out of range" }),
            }
        })?;

        let body = json!({
            "BusinessShortCode": self.config.shortcode,
            "Password": password,
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": whole_amount,
            "PartyA": phone.as_str(),
            "PartyB": self.config.shortcode,
            "PhoneNumber": phone.as_str(),
            "CallBackURL": self.config.callback_url,
            "AccountReference": reference,
            "TransactionDesc": "Seekon Apparel order",
        });

        let response = self
            .http
            .post(format!(
                "{}/mpesa/stkpush/v1/processrequest",
                self.config.base_url
            ))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;

        if !status.is_success() {
            let message = payload
                .get("errorMessage")
                .and_then(Value::as_str)
                .unwrap_or("STK push rejected")
                .to_string();
            return Err(ProviderError::Rejected { message, payload });
        }

        // A 200 with a non-zero ResponseCode is still a rejection.
        let response_code = payload.get("ResponseCode").and_then(Value::as_str);
        if response_code != Some("0") {
            let message = payload
                .get("ResponseDescription")
                .and_then(Value::as_str)
                .unwrap_or("STK push not accepted")
                .to_string();
            return Err(ProviderError::Rejected { message, payload });
        }

        let checkout_request_id = payload
            .get("CheckoutRequestID")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Rejected {
                message: "response missing CheckoutRequestID".to_string(),
                payload: payload.clone(),
            })?;

        Ok(StkPush {
            checkout_request_id,
            merchant_request_id: payload
                .get("MerchantRequestID")
                .and_then(Value::as_str)
                .map(str::to_string),
            customer_message: payload
                .get("CustomerMessage")
                .and_then(Value::as_str)
                .map(str::to_string),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_uses_daraja_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap();
        assert_eq!(MpesaClient::daraja_timestamp(at), "20240115103005");
    }

    #[test]
    fn password_is_base64_of_concatenation() {
        let password = MpesaClient::stk_password("174379", "passkey", "20240115103005");
        let decoded = STANDARD.decode(password).unwrap();
        assert_eq!(decoded, b"174379passkey20240115103005");
    }
}

//! Payment provider clients (M-Pesa Daraja, Flutterwave).
//!
//! Both clients borrow the shared [`reqwest::Client`] and their config
//! from [`crate::state::AppState`]; neither caches credentials between
//! calls. Absent configuration is handled upstream as mock mode, never
//! here.

pub mod flutterwave;
pub mod mpesa;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure: the request never produced a provider
    /// response body.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered and declined. The raw payload is kept so it
    /// can be stored on the transaction.
    #[error("{message}")]
    Rejected {
        message: String,
        payload: serde_json::Value,
    },
}

impl ProviderError {
    /// Payload to persist as the transaction's provider response.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            ProviderError::Http(e) => serde_json::json!({ "error": e.to_string() }),
            ProviderError::Rejected { payload, .. } => payload.clone(),
        }
    }
}

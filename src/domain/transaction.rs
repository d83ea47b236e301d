//! Payment transaction state machine.
//!
//! `pending` is the only non-terminal state. Webhooks can arrive twice or
//! out of order, so terminal states never transition again; a repeat or
//! late callback is rejected here and treated as a no-op by the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown transaction status: {0}")]
pub struct UnknownStatus(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mpesa,
    Card,
    Flutterwave,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mpesa => "mpesa",
            Self::Card => "card",
            Self::Flutterwave => "flutterwave",
        }
    }
}

/// Events that drive a transaction out of `pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Provider callback with a success result code.
    ProviderSucceeded,
    /// Provider callback with any non-success result code.
    ProviderFailed,
    /// Reconciliation sweep expired a stale pending transaction.
    Expired,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("transaction in terminal state {current} cannot accept {event:?}")]
pub struct TransitionRejected {
    pub current: TransactionStatus,
    pub event: PaymentEvent,
}

/// The only honored transitions are out of `pending`. Everything else is
/// rejected so callers can treat duplicate or out-of-order webhook
/// delivery as a no-op.
pub fn transition(
    current: TransactionStatus,
    event: PaymentEvent,
) -> Result<TransactionStatus, TransitionRejected> {
    match current {
        TransactionStatus::Pending => Ok(match event {
            PaymentEvent::ProviderSucceeded => TransactionStatus::Completed,
            PaymentEvent::ProviderFailed => TransactionStatus::Failed,
            PaymentEvent::Expired => TransactionStatus::Cancelled,
        }),
        terminal => Err(TransitionRejected { current: terminal, event }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_completed_on_success() {
        assert_eq!(
            transition(TransactionStatus::Pending, PaymentEvent::ProviderSucceeded),
            Ok(TransactionStatus::Completed)
        );
    }

    #[test]
    fn pending_moves_to_failed_on_failure() {
        assert_eq!(
            transition(TransactionStatus::Pending, PaymentEvent::ProviderFailed),
            Ok(TransactionStatus::Failed)
        );
    }

    #[test]
    fn pending_expires_to_cancelled() {
        assert_eq!(
            transition(TransactionStatus::Pending, PaymentEvent::Expired),
            Ok(TransactionStatus::Cancelled)
        );
    }

    #[test]
    fn late_failure_cannot_overwrite_completed() {
        let err = transition(TransactionStatus::Completed, PaymentEvent::ProviderFailed)
            .unwrap_err();
        assert_eq!(err.current, TransactionStatus::Completed);
    }

    #[test]
    fn every_terminal_state_rejects_every_event() {
        for current in [
            TransactionStatus::Completed,
            TransactionStatus::Failed,
            TransactionStatus::Cancelled,
        ] {
            for event in [
                PaymentEvent::ProviderSucceeded,
                PaymentEvent::ProviderFailed,
                PaymentEvent::Expired,
            ] {
                assert!(transition(current, event).is_err());
            }
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
            TransactionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
        assert!("refunded".parse::<TransactionStatus>().is_err());
    }
}

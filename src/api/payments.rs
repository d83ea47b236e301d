//! Payment initiation and provider webhooks.
//!
//! The client-facing path surfaces provider failures as errors; the
//! webhook path swallows them, always answering the provider with a
//! success envelope so a processing hiccup does not trigger a retry
//! storm. Both behaviors are deliberate.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::ok;
use crate::domain::transaction::{PaymentEvent, PaymentMethod, TransactionStatus};
use crate::domain::value_objects::{Money, PaymentReference, PhoneNumber};
use crate::error::{ApiError, ApiResult};
use crate::payment::flutterwave::{is_successful_status, FlutterwaveClient};
use crate::payment::mpesa::MpesaClient;
use crate::state::AppState;
use crate::store::audit::{self, AuditAction};
use crate::store::transactions::{self, CallbackOutcome, NewTransaction};

const MPESA_REF_PREFIX: &str = "MP";
const FLW_REF_PREFIX: &str = "FLW";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MpesaPaymentRequest {
    pub phone_number: String,
    pub amount: Decimal,
    #[validate(email)]
    pub user_email: String,
}

pub async fn initiate_mpesa(
    State(state): State<AppState>,
    Json(req): Json<MpesaPaymentRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;
    let amount = Money::positive(req.amount, "KES")?;
    let phone =
        PhoneNumber::parse(&req.phone_number).map_err(|e| ApiError::Validation(e.to_string()))?;

    // The pending record is durable before any provider contact.
    let reference = PaymentReference::generate(MPESA_REF_PREFIX);
    let tx = transactions::insert_pending(
        &state.db,
        &NewTransaction {
            user_email: req.user_email.clone(),
            phone_number: Some(phone.as_str().to_string()),
            method: PaymentMethod::Mpesa,
            amount: amount.amount(),
            currency: amount.currency().to_string(),
            reference: reference.clone(),
        },
    )
    .await?;
    audit::record(
        &state.db,
        AuditAction::PaymentInitiated,
        &req.user_email,
        "customer",
        json!({ "method": "mpesa", "reference": reference, "amount": amount.amount() }),
    )
    .await;

    let Some(mpesa_config) = &state.config.mpesa else {
        // Mock mode: credentials absent, no outbound call. The synthetic
        // correlation id keeps the callback path exercisable.
        let correlation = format!("MOCK-{reference}");
        transactions::set_provider_response(&state.db, tx.id, Some(&correlation), &json!({ "mock": true }))
            .await?;
        tracing::info!(reference = %reference, "mpesa mock mode, no credentials configured");
        return Ok(ok(json!({
            "transactionId": tx.id,
            "reference": reference,
            "checkoutRequestID": correlation,
            "mock": true,
        })));
    };

    let client = MpesaClient::new(&state.http, mpesa_config);
    match client.stk_push(&phone, &amount.amount(), &reference).await {
        Ok(push) => {
            transactions::set_provider_response(
                &state.db,
                tx.id,
                Some(&push.checkout_request_id),
                &push.payload,
            )
            .await?;
            tracing::info!(
                reference = %reference,
                checkout_request_id = %push.checkout_request_id,
                "stk push accepted"
            );
            Ok(ok(json!({
                "transactionId": tx.id,
                "reference": reference,
                "checkoutRequestID": push.checkout_request_id,
                "customerMessage": push.customer_message,
                "mock": false,
            })))
        }
        Err(e) => {
            // The transaction stays pending; the reconciliation sweep
            // will cancel it if no callback ever arrives.
            transactions::set_provider_response(&state.db, tx.id, None, &e.payload()).await?;
            tracing::error!(reference = %reference, error = %e, "stk push failed");
            Err(ApiError::Provider(e.to_string()))
        }
    }
}

/// M-Pesa webhook. Always answers with a success envelope.
pub async fn mpesa_callback(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    if let Err(e) = process_mpesa_callback(&state, &body).await {
        tracing::error!(error = %e, "mpesa callback processing failed");
    }
    Json(json!({ "ResultCode": 0, "ResultDesc": "Callback received" }))
}

async fn process_mpesa_callback(state: &AppState, body: &Value) -> ApiResult<()> {
    let callback = body
        .pointer("/Body/stkCallback")
        .ok_or_else(|| ApiError::Validation("missing stkCallback body".to_string()))?;
    let correlation_id = callback
        .get("CheckoutRequestID")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Validation("missing CheckoutRequestID".to_string()))?;
    let result_code = callback.get("ResultCode").and_then(Value::as_i64);

    let event = if result_code == Some(0) {
        PaymentEvent::ProviderSucceeded
    } else {
        PaymentEvent::ProviderFailed
    };

    match transactions::apply_callback_by_correlation(&state.db, correlation_id, event, body).await? {
        CallbackOutcome::Applied(status) => {
            let action = if status == TransactionStatus::Completed {
                AuditAction::PaymentCompleted
            } else {
                AuditAction::PaymentFailed
            };
            audit::record(
                &state.db,
                action,
                correlation_id,
                "provider",
                json!({ "resultCode": result_code }),
            )
            .await;
            tracing::info!(correlation_id, status = %status, "mpesa callback applied");
        }
        CallbackOutcome::AlreadySettled(status) => {
            tracing::info!(correlation_id, status = %status, "duplicate mpesa callback ignored");
        }
        CallbackOutcome::Unknown => {
            tracing::warn!(correlation_id, "mpesa callback for unknown transaction");
        }
    }
    Ok(())
}

/// Client-side status check; the server never polls the provider.
pub async fn payment_status(
    State(state): State<AppState>,
    axum::extract::Path(id): axum::extract::Path<uuid::Uuid>,
) -> ApiResult<Json<Value>> {
    let tx = transactions::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("transaction"))?;
    Ok(ok(json!({
        "transactionId": tx.id,
        "reference": tx.reference,
        "method": tx.method,
        "amount": tx.amount,
        "status": tx.status,
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FlutterwavePaymentRequest {
    #[validate(email)]
    pub email: String,
    pub amount: Decimal,
    #[validate(email)]
    pub user_email: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "KES".to_string()
}

pub async fn initiate_flutterwave(
    State(state): State<AppState>,
    Json(req): Json<FlutterwavePaymentRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;
    let amount = Money::positive(req.amount, &req.currency)?;

    // The reference doubles as the Flutterwave tx_ref, so it is also the
    // correlation id for the redirect callback.
    let reference = PaymentReference::generate(FLW_REF_PREFIX);
    let tx = transactions::insert_pending(
        &state.db,
        &NewTransaction {
            user_email: req.user_email.clone(),
            phone_number: None,
            method: PaymentMethod::Flutterwave,
            amount: amount.amount(),
            currency: amount.currency().to_string(),
            reference: reference.clone(),
        },
    )
    .await?;
    audit::record(
        &state.db,
        AuditAction::PaymentInitiated,
        &req.user_email,
        "customer",
        json!({ "method": "flutterwave", "reference": reference, "amount": amount.amount() }),
    )
    .await;

    let Some(flw_config) = &state.config.flutterwave else {
        let link = format!(
            "{}/mock-payment?tx_ref={reference}",
            state.config.frontend_url
        );
        transactions::set_provider_response(&state.db, tx.id, Some(&reference), &json!({ "mock": true }))
            .await?;
        tracing::info!(reference = %reference, "flutterwave mock mode, no credentials configured");
        return Ok(ok(json!({
            "transactionId": tx.id,
            "reference": reference,
            "paymentLink": link,
            "mock": true,
        })));
    };

    let client = FlutterwaveClient::new(&state.http, flw_config);
    match client
        .create_payment_link(&req.email, &amount.amount(), amount.currency(), &reference)
        .await
    {
        Ok(payment_link) => {
            transactions::set_provider_response(&state.db, tx.id, Some(&reference), &payment_link.payload)
                .await?;
            tracing::info!(reference = %reference, "flutterwave payment link created");
            Ok(ok(json!({
                "transactionId": tx.id,
                "reference": reference,
                "paymentLink": payment_link.link,
                "mock": false,
            })))
        }
        Err(e) => {
            transactions::set_provider_response(&state.db, tx.id, Some(&reference), &e.payload())
                .await?;
            tracing::error!(reference = %reference, error = %e, "flutterwave initiation failed");
            Err(ApiError::Provider(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FlutterwaveCallbackParams {
    pub status: Option<String>,
    pub tx_ref: Option<String>,
}

/// Flutterwave redirect callback. Like the M-Pesa webhook this never
/// errors outward; the customer always lands on a frontend page.
pub async fn flutterwave_callback(
    State(state): State<AppState>,
    Query(params): Query<FlutterwaveCallbackParams>,
) -> Redirect {
    let frontend = &state.config.frontend_url;
    let Some(tx_ref) = params.tx_ref else {
        return Redirect::temporary(&format!("{frontend}/payment/failed"));
    };
    let status = params.status.unwrap_or_default();
    let event = if is_successful_status(&status) {
        PaymentEvent::ProviderSucceeded
    } else {
        PaymentEvent::ProviderFailed
    };
    let callback = json!({ "status": status, "tx_ref": tx_ref });

    let settled_ok = match transactions::apply_callback_by_reference(&state.db, &tx_ref, event, &callback)
        .await
    {
        Ok(CallbackOutcome::Applied(new_status)) => {
            let action = if new_status == TransactionStatus::Completed {
                AuditAction::PaymentCompleted
            } else {
                AuditAction::PaymentFailed
            };
            audit::record(&state.db, action, &tx_ref, "provider", callback.clone()).await;
            tracing::info!(tx_ref = %tx_ref, status = %new_status, "flutterwave callback applied");
            new_status == TransactionStatus::Completed
        }
        Ok(CallbackOutcome::AlreadySettled(current)) => {
            tracing::info!(tx_ref = %tx_ref, status = %current, "duplicate flutterwave callback ignored");
            current == TransactionStatus::Completed
        }
        Ok(CallbackOutcome::Unknown) => {
            tracing::warn!(tx_ref = %tx_ref, "flutterwave callback for unknown transaction");
            false
        }
        Err(e) => {
            tracing::error!(tx_ref = %tx_ref, error = %e, "flutterwave callback processing failed");
            false
        }
    };

    if settled_ok {
        Redirect::temporary(&format!("{frontend}/payment/success?reference={tx_ref}"))
    } else {
        Redirect::temporary(&format!("{frontend}/payment/failed?reference={tx_ref}"))
    }
}

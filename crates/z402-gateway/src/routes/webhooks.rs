use actix_web::{web, HttpRequest, HttpResponse};

use z402::intent::WebhookEvent;
use z402::webhook;

use crate::metrics;
use crate::state::AppState;
use crate::store::ReconcileOutcome;

pub const WEBHOOK_PATH: &str = "/webhooks/z402";

/// POST /webhooks/z402 — the payment backend's event stream.
///
/// The body stays raw bytes until the `x-z402-signature` header verifies;
/// nothing branches on contents of an unauthenticated payload. Once
/// authenticated, every reconciliation outcome short of a store failure is
/// acknowledged — the sender retries on anything else, and retries must
/// stay harmless.
pub async fn receive(req: HttpRequest, state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let now = chrono::Utc::now().timestamp();

    let signature = req
        .headers()
        .get(webhook::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let signature = match signature {
        Some(sig) => sig,
        None => {
            metrics::WEBHOOK_AUTH_FAILURES
                .with_label_values(&["missing"])
                .inc();
            tracing::warn!("webhook delivery missing signature header");
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "missing_signature",
                "message": "Missing x-z402-signature header",
            }));
        }
    };

    if !webhook::verify(
        &state.config.webhook_secret,
        &body,
        signature,
        now,
        webhook::DEFAULT_TOLERANCE_SECS,
    ) {
        metrics::WEBHOOK_AUTH_FAILURES
            .with_label_values(&["invalid"])
            .inc();
        tracing::warn!("webhook signature verification failed");
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "invalid_signature",
            "message": "Webhook signature verification failed",
        }));
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "authenticated webhook with malformed payload");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_request",
                "message": "Webhook payload is not a valid event",
            }));
        }
    };

    match state.store.apply_event(&event.event_type, &event.data.id, now) {
        Ok(outcome) => {
            metrics::WEBHOOK_EVENTS
                .with_label_values(&[outcome.label()])
                .inc();
            match outcome {
                ReconcileOutcome::Applied { from, to } => tracing::info!(
                    event = %event.event_type,
                    intent_id = %event.data.id,
                    %from,
                    %to,
                    "webhook event applied"
                ),
                ReconcileOutcome::Duplicate => tracing::debug!(
                    event = %event.event_type,
                    intent_id = %event.data.id,
                    "duplicate webhook delivery"
                ),
                ReconcileOutcome::Ignored { status } => tracing::info!(
                    event = %event.event_type,
                    intent_id = %event.data.id,
                    %status,
                    "late or inapplicable webhook event dropped"
                ),
                ReconcileOutcome::UnknownEvent => tracing::info!(
                    event = %event.event_type,
                    intent_id = %event.data.id,
                    "unrecognized webhook event type recorded"
                ),
                ReconcileOutcome::UnknownIntent => tracing::warn!(
                    event = %event.event_type,
                    intent_id = %event.data.id,
                    "webhook event for unknown intent"
                ),
                ReconcileOutcome::NoOp => {}
            }
            HttpResponse::Ok().json(serde_json::json!({ "received": true }))
        }
        Err(e) => {
            metrics::WEBHOOK_EVENTS
                .with_label_values(&["store_error"])
                .inc();
            // 500 prompts the sender's retry-with-backoff; the event is not
            // marked processed, so the retry will apply it.
            tracing::error!(error = %e, "webhook reconciliation failed");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "Webhook processing failed",
            }))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(WEBHOOK_PATH, web::post().to(receive));
}

use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::error::GatewayError;
use crate::intents;
use crate::metrics;
use crate::state::AppState;
use crate::verifier::AccessDecision;

pub const PREMIUM_PATH: &str = "/api/premium";

/// GET /api/premium — the protected resource.
///
/// No `authorization` header: mint (or reuse) a payment intent and answer
/// with a 402 challenge carrying the discovery URL. Header present: decide
/// through the verifier; allow and deny paths write nothing.
pub async fn premium(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let now = chrono::Utc::now().timestamp();

    let raw_token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    let raw_token = match raw_token {
        Some(token) => token,
        None => return challenge(&state, now),
    };

    match state.verifier.check(raw_token, now) {
        Ok(AccessDecision::Granted(intent)) => {
            metrics::ACCESS.with_label_values(&["granted"]).inc();
            tracing::info!(intent_id = %intent.id, "premium access granted");
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Premium content unlocked",
                "data": {
                    "secret": "This is exclusive premium content",
                    "intentId": intent.id,
                    "timestamp": now,
                },
            }))
        }
        Ok(AccessDecision::Denied(denial)) => {
            metrics::ACCESS.with_label_values(&["denied"]).inc();
            tracing::info!(reason = denial.code(), "premium access denied");
            HttpResponse::Unauthorized().json(serde_json::json!({
                "error": denial.code(),
                "message": denial.message(),
            }))
        }
        Err(e @ GatewayError::Validation(_)) => {
            metrics::ACCESS.with_label_values(&["invalid"]).inc();
            e.error_response()
        }
        // An unreadable store must never grant; degrade to denial.
        Err(e) => {
            metrics::ACCESS.with_label_values(&["error"]).inc();
            tracing::error!(error = %e, "access check failed, denying");
            HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "access_denied",
                "message": "Unable to verify payment authorization",
            }))
        }
    }
}

fn challenge(state: &AppState, now: i64) -> HttpResponse {
    match intents::create_intent(&state.store, &state.config, PREMIUM_PATH, now) {
        Ok((intent, payment_url)) => {
            metrics::CHALLENGES.inc();
            tracing::info!(intent_id = %intent.id, "issued payment challenge");
            HttpResponse::PaymentRequired().json(serde_json::json!({
                "error": "payment_required",
                "message": format!(
                    "This content requires a payment of {} {}",
                    intent.amount, intent.currency
                ),
                "paymentUrl": payment_url,
            }))
        }
        Err(e) => e.error_response(),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(PREMIUM_PATH, web::get().to(premium));
}

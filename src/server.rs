// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Router assembly.

use crate::captcha::CaptchaGate;
use crate::claim;
use crate::gate;
use crate::handlers::{self, AppState};
use crate::limiter::RateLimiter;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the service router.
///
/// Claims pass, outermost first: body extraction, rate limiter, CAPTCHA,
/// then the payout handler. A CAPTCHA failure is a non-success answer as
/// far as the rate limiter is concerned, so it releases the limiter entries.
pub fn router(state: Arc<AppState>) -> Router {
    let claim_routes = Router::new()
        .route("/api/claim", post(handlers::claim))
        .route_layer(middleware::from_fn_with_state(
            state.captcha.clone(),
            gate::enforce::<CaptchaGate>,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            gate::enforce::<RateLimiter>,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.claims.clone(),
            claim::extract_claim,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::health))
        .route("/api/info", get(handlers::info))
        .merge(claim_routes);

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(handlers::metrics));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

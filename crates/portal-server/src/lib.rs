pub mod auth;
pub mod error;
pub mod respond;
pub mod routes;
pub mod state;
pub mod validation;

use anyhow::bail;
use axum::routing::{get, post};
use axum::Router;
use portal_core::config::{PortalConfig, WarnLevel};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Session
        .route("/api/session", get(routes::session::get_session))
        .route("/api/dashboard", get(routes::session::get_dashboard))
        // Claims
        .route(
            "/api/claims",
            get(routes::claims::list_claims).post(routes::claims::submit_claim),
        )
        // Raffles
        .route("/api/raffles", get(routes::raffles::list_raffles))
        .route(
            "/api/raffles/{raffle_id}/entries",
            post(routes::raffles::enter_raffle),
        )
        // Curriculum
        .route("/api/curriculum", get(routes::curriculum::get_curriculum))
        .route(
            "/api/lessons/{lesson_id}/complete",
            post(routes::curriculum::complete_lesson),
        )
        // Mastery & XP
        .route("/api/mastery", get(routes::mastery::get_mastery))
        .route("/api/xp/leaderboard", get(routes::xp::leaderboard))
        // Chat
        .route(
            "/api/chat/messages",
            get(routes::chat::list_messages).post(routes::chat::post_message),
        )
        // Admin
        .route("/api/admin/claims", get(routes::claims::admin_list_claims))
        .route(
            "/api/admin/claims/{claim_id}/review",
            post(routes::claims::review_claim),
        )
        .route("/api/admin/raffles", post(routes::raffles::create_raffle))
        .route(
            "/api/admin/raffles/{raffle_id}/draw",
            post(routes::raffles::draw_raffle),
        )
        .route(
            "/api/admin/curriculum/publish",
            post(routes::curriculum::publish_curriculum),
        )
        .route("/api/admin/xp/grants", post(routes::xp::grant_xp))
        .route("/api/admin/broadcast", post(routes::broadcast::broadcast))
        .route("/api/admin/mastery", get(routes::mastery::mastery_report))
        .route(
            "/api/admin/chat/{message_id}/moderate",
            post(routes::chat::moderate_message),
        )
        .route("/api/admin/users", post(routes::users::provision_user))
        // Public
        .route(
            "/api/auth/password-reset",
            post(routes::users::password_reset),
        )
        .route("/healthz", get(routes::health::healthz))
        .fallback(routes::fallback::not_found)
        .method_not_allowed_fallback(routes::fallback::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Log configuration warnings and refuse to start on any error-level one.
fn check_config(config: &PortalConfig) -> anyhow::Result<()> {
    let mut fatal = 0;
    for warning in config.validate() {
        match warning.level {
            WarnLevel::Error => {
                tracing::error!("{}", warning.message);
                fatal += 1;
            }
            WarnLevel::Warning => tracing::warn!("{}", warning.message),
        }
    }
    if fatal > 0 {
        bail!("refusing to start: {fatal} configuration error(s)");
    }
    Ok(())
}

/// Start the portal BFF on `0.0.0.0:<port>`.
pub async fn serve(config: PortalConfig, port: u16) -> anyhow::Result<()> {
    check_config(&config)?;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    run(config, listener).await
}

/// Start the portal BFF on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    config: PortalConfig,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    check_config(&config)?;
    run(config, listener).await
}

async fn run(config: PortalConfig, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(state::AppState::from_config(config));

    tracing::info!("portal BFF listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}

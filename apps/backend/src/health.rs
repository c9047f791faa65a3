use actix_web::{web, HttpResponse};

use crate::state::app_state::AppState;
use crate::AppError;

async fn health() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().body("ok"))
}

/// Live game count, for operators.
async fn stats(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "games": app_state.registry.len(),
        "rooms": app_state.hub.room_count(),
    })))
}

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/health/stats", web::get().to(stats));
}

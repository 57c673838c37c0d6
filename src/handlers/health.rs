use actix_web::{web, HttpResponse, Result};
use crate::models::ApiResponse;
use crate::state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let message = format!("Service is healthy, source: {}", state.service.source_label());
    Ok(HttpResponse::Ok().json(ApiResponse::success(message)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

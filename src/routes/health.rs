use actix_web::{HttpResponse, Result as ActixResult, web};

use crate::config::AppConfig;
use crate::models::{ApiResponse, AppStartTime, system::HealthResponse};

pub async fn health(start_time: web::Data<AppStartTime>) -> ActixResult<HttpResponse> {
    let now = chrono::Utc::now();
    let response = HealthResponse {
        status: "ok".to_string(),
        system_name: AppConfig::get().app.system_name.clone(),
        started_at: start_time.start_datetime,
        uptime_seconds: (now - start_time.start_datetime).num_seconds(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Service is healthy")))
}

// 配置路由
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/v1/health", web::get().to(health));
}

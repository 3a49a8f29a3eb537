use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};

use super::{current_user, respond};
use crate::middlewares;
use crate::models::auth::requests::LoginRequest;
use crate::services::AuthService;

pub async fn login(
    service: web::Data<AuthService>,
    user_data: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    let result = service.login(user_data.into_inner()).await;
    Ok(respond("login", StatusCode::OK, "Login successful", result))
}

pub async fn get_user(
    request: HttpRequest,
    service: web::Data<AuthService>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.me(&user).await;
    Ok(respond("get_user", StatusCode::OK, "User info retrieved", result))
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .route("/login", web::post().to(login))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .route("/me", web::get().to(get_user)),
            ),
    );
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};

use super::{current_user, respond};
use crate::middlewares;
use crate::models::submissions::requests::ReviewSubmissionRequest;
use crate::models::users::entities::UserRole;
use crate::services::SubmissionService;

// 获取提交详情
pub async fn get_submission(
    req: HttpRequest,
    service: web::Data<SubmissionService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.get_submission(&user, path.into_inner()).await;
    Ok(respond("get_submission", StatusCode::OK, "Submission retrieved", result))
}

// 批改提交
pub async fn review_submission(
    req: HttpRequest,
    service: web::Data<SubmissionService>,
    path: web::Path<i64>,
    body: web::Json<ReviewSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .review_submission(&user, path.into_inner(), body.into_inner())
        .await;
    Ok(respond("review_submission", StatusCode::OK, "Submission reviewed", result))
}

// 配置路由
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            .service(web::resource("/{id}").route(web::get().to(get_submission)))
            .service(
                web::resource("/{id}/review").route(
                    web::put()
                        .to(review_submission)
                        .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                ),
            ),
    );
}

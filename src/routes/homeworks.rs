use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};

use super::{current_user, error_response, respond};
use crate::middlewares;
use crate::models::ApiResponse;
use crate::models::homeworks::requests::{CreateHomeworkRequest, UpdateHomeworkRequest};
use crate::models::submissions::requests::SubmitHomeworkRequest;
use crate::models::users::entities::UserRole;
use crate::services::{HomeworkService, SubmissionService};

// 列出作业（教师为本人布置的作业，学生为布置给自己的作业）
pub async fn list_homeworks(
    req: HttpRequest,
    service: web::Data<HomeworkService>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.list_homeworks(&user).await;
    Ok(respond("list_homeworks", StatusCode::OK, "Homeworks retrieved", result))
}

// 创建作业
pub async fn create_homework(
    req: HttpRequest,
    service: web::Data<HomeworkService>,
    body: web::Json<CreateHomeworkRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.create_homework(&user, body.into_inner()).await;
    Ok(respond("create_homework", StatusCode::CREATED, "Homework created", result))
}

// 获取作业详情
pub async fn get_homework(
    req: HttpRequest,
    service: web::Data<HomeworkService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.get_homework(&user, path.into_inner()).await;
    Ok(respond("get_homework", StatusCode::OK, "Homework retrieved", result))
}

// 更新作业
pub async fn update_homework(
    req: HttpRequest,
    service: web::Data<HomeworkService>,
    path: web::Path<i64>,
    body: web::Json<UpdateHomeworkRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .update_homework(&user, path.into_inner(), body.into_inner())
        .await;
    Ok(respond("update_homework", StatusCode::OK, "Homework updated", result))
}

// 删除作业
pub async fn delete_homework(
    req: HttpRequest,
    service: web::Data<HomeworkService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    match service.delete_homework(&user, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Homework deleted"))),
        Err(e) => Ok(error_response("delete_homework", &e)),
    }
}

// 提交作业
pub async fn submit_homework(
    req: HttpRequest,
    service: web::Data<SubmissionService>,
    path: web::Path<i64>,
    body: web::Json<SubmitHomeworkRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .submit_homework(&user, path.into_inner(), body.into_inner())
        .await;
    Ok(respond("submit_homework", StatusCode::CREATED, "Homework submitted", result))
}

// 配置路由
pub fn configure_homeworks_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/homeworks")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    // 列出作业 - 所有登录用户可访问（业务层按角色返回不同数据）
                    .route(web::get().to(list_homeworks))
                    // 创建作业 - 仅教师
                    .route(
                        web::post()
                            .to(create_homework)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    ),
            )
            .service(
                web::resource("/{id}")
                    // 获取作业详情 - 业务层检查归属或访问权限
                    .route(web::get().to(get_homework))
                    .route(
                        web::put()
                            .to(update_homework)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    )
                    .route(
                        web::delete()
                            .to(delete_homework)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    ),
            )
            .service(
                web::resource("/{id}/submit").route(
                    web::post()
                        .to(submit_homework)
                        .wrap(middlewares::RequireRole::new(UserRole::Student)),
                ),
            ),
    );
}

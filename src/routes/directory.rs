use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};

use super::{current_user, error_response, respond};
use crate::middlewares;
use crate::models::directory::{
    requests::{
        CreateGroupRequest, CreateStudentRequest, SetStudentGroupRequest, StudentListQuery,
        UpdateGroupRequest, UpdateStudentRequest,
    },
    responses::{GroupListResponse, StudentListResponse},
};
use crate::models::homeworks::responses::HomeworkListResponse;
use crate::models::users::entities::UserRole;
use crate::models::ApiResponse;
use crate::services::DirectoryService;

// 创建小组
pub async fn create_group(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    body: web::Json<CreateGroupRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.create_group(&user, body.into_inner()).await;
    Ok(respond("create_group", StatusCode::CREATED, "Group created", result))
}

// 列出本人的小组
pub async fn list_groups(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .list_groups(&user)
        .await
        .map(|items| GroupListResponse { items });
    Ok(respond("list_groups", StatusCode::OK, "Groups retrieved", result))
}

// 小组详情及成员
pub async fn get_group(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.get_group(&user, path.into_inner()).await;
    Ok(respond("get_group", StatusCode::OK, "Group retrieved", result))
}

// 更新小组名称与上课时间
pub async fn update_group(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
    body: web::Json<UpdateGroupRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .update_group(&user, path.into_inner(), body.into_inner())
        .await;
    Ok(respond("update_group", StatusCode::OK, "Group updated", result))
}

// 删除小组
pub async fn delete_group(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    match service.delete_group(&user, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Group deleted"))),
        Err(e) => Ok(error_response("delete_group", &e)),
    }
}

// 创建学生及登录账号
pub async fn create_student(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    body: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.create_student(&user, body.into_inner()).await;
    Ok(respond("create_student", StatusCode::CREATED, "Student created", result))
}

// 列出学生，可按小组过滤
pub async fn list_students(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    query: web::Query<StudentListQuery>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .list_students(&user, query.group_id)
        .await
        .map(|items| StudentListResponse { items });
    Ok(respond("list_students", StatusCode::OK, "Students retrieved", result))
}

// 学生详情
pub async fn get_student(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service.get_student(&user, path.into_inner()).await;
    Ok(respond("get_student", StatusCode::OK, "Student retrieved", result))
}

// 学生的作业记录
pub async fn list_student_homeworks(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .list_student_homeworks(&user, path.into_inner())
        .await
        .map(|items| HomeworkListResponse { items });
    Ok(respond(
        "list_student_homeworks",
        StatusCode::OK,
        "Student homeworks retrieved",
        result,
    ))
}

// 更新学生档案与登录账号
pub async fn update_student(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
    body: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .update_student(&user, path.into_inner(), body.into_inner())
        .await;
    Ok(respond("update_student", StatusCode::OK, "Student updated", result))
}

// 调整学生所在小组
pub async fn set_student_group(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
    body: web::Json<SetStudentGroupRequest>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let result = service
        .set_student_group(&user, path.into_inner(), body.into_inner())
        .await;
    Ok(respond("set_student_group", StatusCode::OK, "Student group updated", result))
}

// 删除学生
pub async fn delete_student(
    req: HttpRequest,
    service: web::Data<DirectoryService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    match service.delete_student(&user, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student deleted"))),
        Err(e) => Ok(error_response("delete_student", &e)),
    }
}

// 配置路由
pub fn configure_directory_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/groups")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(
                        web::get()
                            .to(list_groups)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    )
                    .route(
                        web::post()
                            .to(create_group)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    ),
            )
            .service(
                web::resource("/{id}")
                    // 小组详情 - 所属教师或组内学生，业务层检查
                    .route(web::get().to(get_group))
                    .route(
                        web::put()
                            .to(update_group)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    )
                    .route(
                        web::delete()
                            .to(delete_group)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    ),
            ),
    )
    .service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(
                        web::get()
                            .to(list_students)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    )
                    .route(
                        web::post()
                            .to(create_student)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    ),
            )
            .service(
                web::resource("/{id}")
                    // 学生详情 - 所属教师或学生本人，业务层检查
                    .route(web::get().to(get_student))
                    .route(
                        web::put()
                            .to(update_student)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    )
                    .route(
                        web::delete()
                            .to(delete_student)
                            .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                    ),
            )
            .service(
                web::resource("/{id}/homeworks").route(
                    web::get()
                        .to(list_student_homeworks)
                        .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                ),
            )
            .service(
                web::resource("/{id}/group").route(
                    web::put()
                        .to(set_student_group)
                        .wrap(middlewares::RequireRole::new(UserRole::Teacher)),
                ),
            ),
    );
}

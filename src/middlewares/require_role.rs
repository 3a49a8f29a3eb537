/*!
 * 角色检查中间件
 *
 * 必须在 RequireJWT 之后使用。教师与学生接口分别用
 * `RequireRole::new(UserRole::Teacher)` 和 `RequireRole::new(UserRole::Student)` 包裹。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::middlewares::RequireJWT;
use crate::models::{ErrorCode, users::entities::UserRole};

use super::create_error_response;

#[derive(Clone, Copy)]
pub struct RequireRole {
    role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        Self { role }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            role: self.role,
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required = self.role;

        Box::pin(async move {
            let (status, code, message) = match RequireJWT::extract_user_claims(req.request()) {
                Some(user) if user.role == required => {
                    return Ok(srv.call(req).await?.map_into_left_body());
                }
                Some(user) => {
                    info!(
                        "用户 {} ({}) 访问 {} 被拒绝，需要角色 {}",
                        user.id,
                        user.role,
                        req.path(),
                        required
                    );
                    (
                        StatusCode::FORBIDDEN,
                        ErrorCode::Forbidden,
                        format!("This endpoint is only available to {required}s"),
                    )
                }
                None => {
                    // 未经过 RequireJWT
                    info!("角色检查失败: 请求中没有当前用户 {}", req.path());
                    (
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required".to_string(),
                    )
                }
            };

            Ok(req.into_response(
                create_error_response(status, code, &message).map_into_right_body(),
            ))
        })
    }
}

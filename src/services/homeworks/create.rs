use super::{HomeworkService, normalize_link, referenced_tokens};
use crate::domain::validate_assignments;
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::{
    entities::Homework,
    requests::{CreateHomeworkRequest, HomeworkDraft},
};
use crate::models::users::entities::User;

pub async fn create_homework(
    service: &HomeworkService,
    user: &User,
    req: CreateHomeworkRequest,
) -> Result<Homework> {
    if !user.is_teacher() {
        return Err(HWSystemError::authorization("only teachers can create homework"));
    }

    let tokens = referenced_tokens(&req.assignments);

    match build_and_store(service, user, req).await {
        Ok(homework) => {
            tracing::info!(
                "教师 {} 创建作业 {} ({} 道小题)",
                user.id,
                homework.id,
                homework.assignments.len()
            );
            Ok(service.present(homework))
        }
        Err(e) => {
            if e.is_internal() {
                tracing::error!("创建作业失败: teacher={}, error={}", user.id, e);
            }
            // 补偿：清理请求引用且没有被其他作业使用的附件
            service.purge_tokens(user.id, tokens).await;
            Err(e)
        }
    }
}

async fn build_and_store(
    service: &HomeworkService,
    user: &User,
    req: CreateHomeworkRequest,
) -> Result<Homework> {
    let link = normalize_link(req.link)?;
    let audience = service.validate_audience(user.id, req.audience).await?;
    let specs = service.resolve_assignments(user.id, req.assignments).await?;
    let assignments = validate_assignments(specs, &[])?;

    let draft = HomeworkDraft {
        description: req.description.unwrap_or_default().trim().to_string(),
        deadline: req.deadline,
        category: req.category,
        link,
        audience,
        assignments,
    };

    service.storage.create_homework(user.id, draft).await
}

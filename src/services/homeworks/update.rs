use std::collections::HashSet;

use super::{HomeworkService, normalize_link, referenced_tokens};
use crate::domain::validate_assignments;
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::{
    entities::Homework,
    requests::{HomeworkDraft, UpdateHomeworkRequest},
};
use crate::models::users::entities::User;

pub async fn update_homework(
    service: &HomeworkService,
    user: &User,
    homework_id: i64,
    req: UpdateHomeworkRequest,
) -> Result<Homework> {
    // 1. 读取并确认归属
    let existing = service.owned_homework(user, homework_id).await?;

    // 2. 已有提交时冻结结构性字段
    let structural = req.touches_structure();
    if structural && service.storage.count_submissions(homework_id).await?.submitted > 0 {
        return Err(HWSystemError::homework_locked(format!(
            "homework {homework_id} already has submissions; only description and link can change"
        )));
    }

    // 本次新引用的附件，失败时需要清理
    let old_tokens: HashSet<&str> = existing.attachments().map(|a| a.token.as_str()).collect();
    let new_tokens: Vec<String> = req
        .assignments
        .as_deref()
        .map(referenced_tokens)
        .unwrap_or_default()
        .into_iter()
        .filter(|t| !old_tokens.contains(t.as_str()))
        .collect();

    let result = match build_draft(service, user, &existing, req).await {
        Ok(draft) => {
            service
                .storage
                .update_homework(homework_id, draft, structural)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(updated) => {
            // 3. 清理被移除的附件
            let kept: HashSet<&str> = updated.attachments().map(|a| a.storage_path.as_str()).collect();
            let dropped: Vec<String> = existing
                .attachments()
                .filter(|a| !kept.contains(a.storage_path.as_str()))
                .map(|a| a.storage_path.clone())
                .collect();
            service.purge(dropped).await;

            tracing::info!("教师 {} 更新作业 {}", user.id, homework_id);
            Ok(service.present(updated))
        }
        Err(e) => {
            if e.is_internal() {
                tracing::error!(
                    "更新作业失败: teacher={}, homework={}, error={}",
                    user.id,
                    homework_id,
                    e
                );
            }
            service.purge_tokens(user.id, new_tokens).await;
            Err(e)
        }
    }
}

/// 以现有作业为基础应用补丁
async fn build_draft(
    service: &HomeworkService,
    user: &User,
    existing: &Homework,
    req: UpdateHomeworkRequest,
) -> Result<HomeworkDraft> {
    if req.clear_deadline && req.deadline.is_some() {
        return Err(HWSystemError::invalid_field(
            "deadline",
            "cannot set and clear the deadline at the same time",
        ));
    }

    let description = match req.description {
        Some(description) => description.trim().to_string(),
        None => existing.description.clone(),
    };

    let link = match req.link {
        Some(link) => normalize_link(Some(link))?,
        None => existing.link.clone(),
    };

    let deadline = if req.clear_deadline {
        None
    } else {
        req.deadline.or(existing.deadline)
    };

    let audience = match req.audience {
        Some(audience) => service.validate_audience(user.id, audience).await?,
        None => existing.audience.clone(),
    };

    let assignments = match req.assignments {
        Some(inputs) => {
            let specs = service.resolve_assignments(user.id, inputs).await?;
            validate_assignments(specs, &existing.assignments)?
        }
        None => existing.assignments.clone(),
    };

    Ok(HomeworkDraft {
        description,
        deadline,
        category: req.category.unwrap_or(existing.category),
        link,
        audience,
        assignments,
    })
}

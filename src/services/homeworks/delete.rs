use super::HomeworkService;
use crate::errors::Result;
use crate::models::users::entities::User;

pub async fn delete_homework(
    service: &HomeworkService,
    user: &User,
    homework_id: i64,
) -> Result<()> {
    let homework = service.owned_homework(user, homework_id).await?;

    service.storage.delete_homework(homework_id).await.inspect_err(|e| {
        if e.is_internal() {
            tracing::error!(
                "删除作业失败: teacher={}, homework={}, error={}",
                user.id,
                homework_id,
                e
            );
        }
    })?;

    let paths = homework
        .attachments()
        .map(|a| a.storage_path.clone())
        .collect();
    service.purge(paths).await;

    tracing::info!("教师 {} 删除作业 {}", user.id, homework_id);
    Ok(())
}

use std::collections::HashMap;

use super::HomeworkService;
use crate::domain::can_submit;
use crate::errors::Result;
use crate::models::directory::entities::Student;
use crate::models::homeworks::responses::{HomeworkListItem, HomeworkListResponse};
use crate::models::users::entities::User;
use crate::services::current_student;
use crate::storage::{FileStore, Storage};

pub async fn list_homeworks(service: &HomeworkService, user: &User) -> Result<HomeworkListResponse> {
    if user.is_teacher() {
        let homeworks = service.storage.list_homeworks_by_teacher(user.id).await?;

        let mut items = Vec::with_capacity(homeworks.len());
        for homework in homeworks {
            let progress = service.progress(&homework).await?;
            items.push(HomeworkListItem {
                homework: service.present(homework),
                submission: None,
                can_submit: None,
                progress: Some(progress),
            });
        }
        return Ok(HomeworkListResponse { items });
    }

    let student = current_student(service.storage.as_ref(), user).await?;
    let items = student_homework_items(service.storage.as_ref(), service.files.as_ref(), &student)
        .await?;
    Ok(HomeworkListResponse { items })
}

/// 学生可见的作业，附带本人提交与当前提交资格
pub(crate) async fn student_homework_items(
    storage: &dyn Storage,
    files: &dyn FileStore,
    student: &Student,
) -> Result<Vec<HomeworkListItem>> {
    let homeworks = storage
        .list_homeworks_for_student(student.id, student.group_id)
        .await?;
    let mut submissions: HashMap<i64, _> = storage
        .list_submissions_by_student(student.id)
        .await?
        .into_iter()
        .map(|s| (s.homework_id, s))
        .collect();

    // 提交资格每次读取时重新计算
    let now = chrono::Utc::now();
    let resolve = |path: &str| files.url_for(path);
    Ok(homeworks
        .into_iter()
        .map(|homework| {
            let submission = submissions.remove(&homework.id);
            let eligible = can_submit(&homework, submission.as_ref(), now);
            HomeworkListItem {
                homework: homework.with_urls(resolve),
                submission: submission.map(|s| s.with_urls(resolve)),
                can_submit: Some(eligible),
                progress: None,
            }
        })
        .collect())
}

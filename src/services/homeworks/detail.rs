use super::HomeworkService;
use crate::domain::{can_submit, has_access};
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::{entities::Audience, responses::HomeworkDetailResponse};
use crate::models::users::entities::User;
use crate::services::current_student;

pub async fn get_homework(
    service: &HomeworkService,
    user: &User,
    homework_id: i64,
) -> Result<HomeworkDetailResponse> {
    if user.is_teacher() {
        let homework = service.owned_homework(user, homework_id).await?;

        let submissions = service
            .storage
            .list_submissions_by_homework(homework_id)
            .await?
            .into_iter()
            .map(|s| s.with_urls(|p| service.files.url_for(p)))
            .collect();
        let students = match &homework.audience {
            Audience::Group { group_id } => service.storage.list_students_by_group(*group_id).await?,
            Audience::Individual { student_ids } => {
                service.storage.get_students_by_ids(student_ids).await?
            }
        };
        let progress = service.progress(&homework).await?;

        return Ok(HomeworkDetailResponse {
            homework: service.present(homework),
            submission: None,
            can_submit: None,
            submissions: Some(submissions),
            students: Some(students),
            progress: Some(progress),
        });
    }

    let student = current_student(service.storage.as_ref(), user).await?;
    let homework = service
        .storage
        .get_homework_by_id(homework_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("homework {homework_id} not found")))?;

    if !has_access(&homework, &student) {
        return Err(HWSystemError::authorization(format!(
            "homework {homework_id} is not assigned to you"
        )));
    }

    let submission = service
        .storage
        .get_submission_for(homework_id, student.id)
        .await?;
    let eligible = can_submit(&homework, submission.as_ref(), chrono::Utc::now());

    Ok(HomeworkDetailResponse {
        homework: service.present(homework),
        submission: submission.map(|s| s.with_urls(|p| service.files.url_for(p))),
        can_submit: Some(eligible),
        submissions: None,
        students: None,
        progress: None,
    })
}

use super::SubmissionService;
use crate::domain::{deadline_passed, has_access, match_answers, status_after_submit};
use crate::errors::{HWSystemError, Result};
use crate::models::submissions::{
    entities::Submission,
    requests::{NewSubmission, SubmitHomeworkRequest},
};
use crate::models::users::entities::User;
use crate::services::{current_student, files::resolve_upload};

/// 提交作业
///
/// 错误优先级：作业或学生不存在、无权访问、已提交、已过截止时间、答案不合法。
pub async fn submit_homework(
    service: &SubmissionService,
    user: &User,
    homework_id: i64,
    req: SubmitHomeworkRequest,
) -> Result<Submission> {
    // 1. 解析作业与学生
    let student = current_student(service.storage.as_ref(), user).await?;
    let homework = service
        .storage
        .get_homework_by_id(homework_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("homework {homework_id} not found")))?;

    // 2. 访问检查
    if !has_access(&homework, &student) {
        return Err(HWSystemError::authorization(format!(
            "homework {homework_id} is not assigned to you"
        )));
    }

    // 3. 重复提交（唯一约束在写入时兜底）
    if service
        .storage
        .get_submission_for(homework_id, student.id)
        .await?
        .is_some()
    {
        return Err(HWSystemError::already_submitted(format!(
            "homework {homework_id} has already been submitted"
        )));
    }

    // 4. 截止时间
    let now = chrono::Utc::now();
    if deadline_passed(&homework, now) {
        return Err(HWSystemError::deadline_passed(format!(
            "the deadline of homework {homework_id} has passed"
        )));
    }

    // 5. 匹配答案并解析答案文件
    let matched = match_answers(&homework, &req.answers)?;
    let mut answers = Vec::with_capacity(matched.len());
    for (index, answer) in matched.into_iter().enumerate() {
        let file = match &answer.file_token {
            Some(token) => {
                let field = format!("answers[{index}].file_token");
                let upload = resolve_upload(service.storage.as_ref(), token, user.id, &field).await?;
                if upload.category != homework.category {
                    return Err(HWSystemError::invalid_field(
                        &field,
                        format!(
                            "file was uploaded as {} but this homework expects {}",
                            upload.category, homework.category
                        ),
                    ));
                }
                Some(upload.to_attachment())
            }
            None => None,
        };
        answers.push(answer.into_answer(file));
    }

    // 6. 写入提交，单人作业的状态回写在同一事务中完成
    let submission = service
        .storage
        .create_submission(
            NewSubmission {
                homework_id,
                student_id: student.id,
                answers,
                submitted_at: now,
            },
            status_after_submit(&homework),
        )
        .await
        .inspect_err(|e| {
            if e.is_internal() {
                tracing::error!(
                    "创建提交失败: homework={}, student={}, error={}",
                    homework_id,
                    student.id,
                    e
                );
            }
        })?;

    tracing::info!(
        "学生 {} 提交作业 {} ({} 个答案)",
        student.id,
        homework_id,
        submission.answers.len()
    );
    Ok(service.present(submission))
}

use chrono::{DateTime, Utc};

use crate::models::directory::entities::Student;
use crate::models::homeworks::entities::{Audience, Homework, HomeworkStatus};
use crate::models::submissions::entities::Submission;

/// 学生是否属于作业对象
pub fn has_access(homework: &Homework, student: &Student) -> bool {
    match &homework.audience {
        Audience::Group { group_id } => student.group_id == Some(*group_id),
        Audience::Individual { student_ids } => student_ids.contains(&student.id),
    }
}

/// 截止时间是否已过，截止时刻本身仍可提交
pub fn deadline_passed(homework: &Homework, now: DateTime<Utc>) -> bool {
    homework.deadline.is_some_and(|deadline| now > deadline)
}

/// 当前能否提交，每次读取时重新计算
pub fn can_submit(
    homework: &Homework,
    existing: Option<&Submission>,
    now: DateTime<Utc>,
) -> bool {
    existing.is_none()
        && homework.status == HomeworkStatus::New
        && !deadline_passed(homework, now)
}

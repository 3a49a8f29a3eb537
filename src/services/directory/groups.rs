use super::{DirectoryService, require_teacher};
use crate::errors::{HWSystemError, Result};
use crate::models::{
    directory::{
        entities::{Group, GroupSchedule, Weekday},
        requests::{CreateGroupRequest, UpdateGroupRequest},
        responses::GroupDetailResponse,
    },
    users::entities::User,
};
use crate::services::current_student;
use crate::services::files::purge_paths;
use crate::utils::validate::validate_clock_time;

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HWSystemError::invalid_field("name", "must not be blank"));
    }
    Ok(name.to_string())
}

fn normalize_time(field: &str, time: Option<String>) -> Result<Option<String>> {
    match time.map(|t| t.trim().to_string()) {
        Some(t) if t.is_empty() => Ok(None),
        Some(t) => {
            validate_clock_time(&t).map_err(|reason| HWSystemError::invalid_field(field, reason))?;
            Ok(Some(t))
        }
        None => Ok(None),
    }
}

/// 校验上课时间：HH:MM 格式，开始早于结束，上课日去重排序
pub(crate) fn normalize_schedule(
    start_time: Option<String>,
    end_time: Option<String>,
    mut days_of_week: Vec<Weekday>,
) -> Result<GroupSchedule> {
    let start_time = normalize_time("start_time", start_time)?;
    let end_time = normalize_time("end_time", end_time)?;

    if let (Some(start), Some(end)) = (&start_time, &end_time) {
        if start >= end {
            return Err(HWSystemError::invalid_field(
                "end_time",
                format!("must be later than start_time {start}"),
            ));
        }
    }

    days_of_week.sort();
    days_of_week.dedup();

    Ok(GroupSchedule {
        start_time,
        end_time,
        days_of_week,
    })
}

pub async fn create_group(
    service: &DirectoryService,
    user: &User,
    req: CreateGroupRequest,
) -> Result<Group> {
    require_teacher(user)?;

    let name = normalize_name(&req.name)?;
    let schedule = normalize_schedule(req.start_time, req.end_time, req.days_of_week)?;

    let group = service.storage.create_group(user.id, &name, schedule).await?;
    tracing::info!("教师 {} 创建小组 {} ({})", user.id, group.id, group.name);
    Ok(group)
}

pub async fn list_groups(service: &DirectoryService, user: &User) -> Result<Vec<Group>> {
    require_teacher(user)?;
    service.storage.list_groups_by_teacher(user.id).await
}

/// 小组详情：所属教师或组内学生可见
pub async fn get_group(
    service: &DirectoryService,
    user: &User,
    group_id: i64,
) -> Result<GroupDetailResponse> {
    let group = if user.is_teacher() {
        service.owned_group(user, group_id).await?
    } else {
        let student = current_student(service.storage.as_ref(), user).await?;
        if student.group_id != Some(group_id) {
            return Err(HWSystemError::authorization(format!(
                "you are not a member of group {group_id}"
            )));
        }
        service
            .storage
            .get_group_by_id(group_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("group {group_id} not found")))?
    };

    let students = service.storage.list_students_by_group(group.id).await?;
    Ok(GroupDetailResponse { group, students })
}

pub async fn update_group(
    service: &DirectoryService,
    user: &User,
    group_id: i64,
    req: UpdateGroupRequest,
) -> Result<Group> {
    require_teacher(user)?;
    let existing = service.owned_group(user, group_id).await?;

    let name = match &req.name {
        Some(name) => normalize_name(name)?,
        None => existing.name,
    };
    let schedule = normalize_schedule(
        req.start_time.or(existing.schedule.start_time),
        req.end_time.or(existing.schedule.end_time),
        req.days_of_week.unwrap_or(existing.schedule.days_of_week),
    )?;

    let group = service
        .storage
        .update_group(group_id, &name, schedule)
        .await?;
    tracing::info!("教师 {} 更新小组 {}", user.id, group_id);
    Ok(group)
}

/// 删除小组：成员移出小组，布置给该小组的作业及其提交一并删除
pub async fn delete_group(service: &DirectoryService, user: &User, group_id: i64) -> Result<()> {
    require_teacher(user)?;
    service.owned_group(user, group_id).await?;

    let paths = service
        .storage
        .delete_group(group_id)
        .await
        .inspect_err(|e| {
            if e.is_internal() {
                tracing::error!(
                    "删除小组失败: teacher={}, group={}, error={}",
                    user.id,
                    group_id,
                    e
                );
            }
        })?;
    purge_paths(service.storage.as_ref(), service.files.as_ref(), paths).await;

    tracing::info!("教师 {} 删除小组 {}", user.id, group_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_rejects_malformed_time() {
        let err = normalize_schedule(Some("9:00".into()), None, Vec::new()).unwrap_err();
        assert!(err.message().contains("start_time"));
    }

    #[test]
    fn test_schedule_requires_start_before_end() {
        let err =
            normalize_schedule(Some("10:00".into()), Some("09:00".into()), Vec::new()).unwrap_err();
        assert!(err.message().contains("end_time"));
    }

    #[test]
    fn test_schedule_clears_blank_times_and_orders_days() {
        let schedule = normalize_schedule(
            Some("  ".into()),
            Some("18:30".into()),
            vec![Weekday::Friday, Weekday::Monday, Weekday::Friday],
        )
        .unwrap();
        assert_eq!(schedule.start_time, None);
        assert_eq!(schedule.end_time.as_deref(), Some("18:30"));
        assert_eq!(schedule.days_of_week, vec![Weekday::Monday, Weekday::Friday]);
    }
}

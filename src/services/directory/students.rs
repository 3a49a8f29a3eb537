use super::{DirectoryService, require_teacher};
use crate::cache::user_cache_key;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    directory::{
        entities::Student,
        requests::{
            CreateStudentRequest, NewStudent, SetStudentGroupRequest, StudentUpdate,
            UpdateStudentRequest,
        },
        responses::{StudentCreatedResponse, StudentDetailResponse},
    },
    homeworks::responses::HomeworkListItem,
    users::entities::User,
};
use crate::services::current_student;
use crate::services::files::purge_paths;
use crate::services::homeworks::list::student_homework_items;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_password, validate_username};

pub async fn create_student(
    service: &DirectoryService,
    user: &User,
    req: CreateStudentRequest,
) -> Result<StudentCreatedResponse> {
    require_teacher(user)?;

    // 1. 校验输入
    let full_name = req.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(HWSystemError::invalid_field("full_name", "must not be blank"));
    }
    let username = req.username.trim().to_string();
    validate_username(&username).map_err(|e| HWSystemError::invalid_field("username", e))?;
    validate_password(&req.password).map_err(|e| HWSystemError::invalid_field("password", e))?;

    if let Some(group_id) = req.group_id {
        match service.owned_group(user, group_id).await {
            Err(e) if !e.is_internal() => {
                return Err(HWSystemError::invalid_field(
                    "group_id",
                    format!("group {group_id} is not one of your groups"),
                ));
            }
            other => other?,
        };
    }

    // 2. 学生档案与登录账号在同一事务中创建
    let password_hash = hash_password(&req.password)?;
    let (student, account) = service
        .storage
        .create_student(
            user.id,
            NewStudent {
                full_name,
                phone: req.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
                group_id: req.group_id,
                username,
                password_hash,
            },
        )
        .await?;

    tracing::info!(
        "教师 {} 创建学生 {} (账号 {})",
        user.id,
        student.id,
        account.username
    );
    Ok(StudentCreatedResponse {
        student,
        username: account.username,
    })
}

pub async fn list_students(
    service: &DirectoryService,
    user: &User,
    group_id: Option<i64>,
) -> Result<Vec<Student>> {
    require_teacher(user)?;

    match group_id {
        Some(group_id) => {
            service.owned_group(user, group_id).await?;
            service.storage.list_students_by_group(group_id).await
        }
        None => service.storage.list_students_by_teacher(user.id).await,
    }
}

/// 学生详情：所属教师或学生本人可见
pub async fn get_student(
    service: &DirectoryService,
    user: &User,
    student_id: i64,
) -> Result<StudentDetailResponse> {
    let student = if user.is_teacher() {
        service.owned_student(user, student_id).await?
    } else {
        let own = current_student(service.storage.as_ref(), user).await?;
        if own.id != student_id {
            return Err(HWSystemError::authorization(
                "students can only view their own profile",
            ));
        }
        own
    };

    let group = match student.group_id {
        Some(group_id) => service.storage.get_group_by_id(group_id).await?,
        None => None,
    };
    let homeworks =
        student_homework_items(service.storage.as_ref(), service.files.as_ref(), &student).await?;

    Ok(StudentDetailResponse {
        student,
        group,
        homeworks,
    })
}

/// 学生的作业记录，仅所属教师可见
pub async fn list_student_homeworks(
    service: &DirectoryService,
    user: &User,
    student_id: i64,
) -> Result<Vec<HomeworkListItem>> {
    require_teacher(user)?;
    let student = service.owned_student(user, student_id).await?;
    student_homework_items(service.storage.as_ref(), service.files.as_ref(), &student).await
}

pub async fn update_student(
    service: &DirectoryService,
    user: &User,
    student_id: i64,
    req: UpdateStudentRequest,
) -> Result<Student> {
    require_teacher(user)?;
    let existing = service.owned_student(user, student_id).await?;

    let full_name = match req.full_name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(HWSystemError::invalid_field("full_name", "must not be blank"));
            }
            name
        }
        None => existing.full_name,
    };
    let phone = match req.phone {
        Some(phone) => Some(phone.trim().to_string()).filter(|p| !p.is_empty()),
        None => existing.phone,
    };
    let username = match req.username {
        Some(username) => {
            let username = username.trim().to_string();
            validate_username(&username)
                .map_err(|e| HWSystemError::invalid_field("username", e))?;
            Some(username)
        }
        None => None,
    };
    let password_hash = match req.password {
        Some(password) => {
            validate_password(&password)
                .map_err(|e| HWSystemError::invalid_field("password", e))?;
            Some(hash_password(&password)?)
        }
        None => None,
    };

    let account = service.storage.get_user_by_student_id(student_id).await?;
    let student = service
        .storage
        .update_student(
            student_id,
            StudentUpdate {
                full_name,
                phone,
                username,
                password_hash,
            },
        )
        .await?;

    // 登录账号的姓名、用户名或密码可能已变化
    if let Some(account) = account {
        service.cache.remove(&user_cache_key(account.id)).await;
    }

    tracing::info!("教师 {} 更新学生 {}", user.id, student_id);
    Ok(student)
}

pub async fn set_student_group(
    service: &DirectoryService,
    user: &User,
    student_id: i64,
    req: SetStudentGroupRequest,
) -> Result<Student> {
    require_teacher(user)?;
    service.owned_student(user, student_id).await?;

    if let Some(group_id) = req.group_id {
        service.owned_group(user, group_id).await?;
    }

    let student = service
        .storage
        .set_student_group(student_id, req.group_id)
        .await?;
    tracing::info!(
        "教师 {} 调整学生 {} 的小组: {:?}",
        user.id,
        student_id,
        student.group_id
    );
    Ok(student)
}

pub async fn delete_student(
    service: &DirectoryService,
    user: &User,
    student_id: i64,
) -> Result<()> {
    require_teacher(user)?;
    service.owned_student(user, student_id).await?;

    // 删除前记下登录账号，用于清理缓存
    let account = service.storage.get_user_by_student_id(student_id).await?;

    let paths = service
        .storage
        .delete_student(student_id)
        .await
        .inspect_err(|e| {
            if e.is_internal() {
                tracing::error!(
                    "删除学生失败: teacher={}, student={}, error={}",
                    user.id,
                    student_id,
                    e
                );
            }
        })?;

    if let Some(account) = account {
        service.cache.remove(&user_cache_key(account.id)).await;
    }
    purge_paths(service.storage.as_ref(), service.files.as_ref(), paths).await;

    tracing::info!("教师 {} 删除学生 {}", user.id, student_id);
    Ok(())
}

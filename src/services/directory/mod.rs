//! 小组与学生名录

pub mod groups;
pub mod students;

use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    directory::{
        entities::{Group, Student},
        requests::{
            CreateGroupRequest, CreateStudentRequest, SetStudentGroupRequest, UpdateGroupRequest,
            UpdateStudentRequest,
        },
        responses::{GroupDetailResponse, StudentCreatedResponse, StudentDetailResponse},
    },
    homeworks::responses::HomeworkListItem,
    users::entities::User,
};
use crate::storage::{FileStore, Storage};

pub struct DirectoryService {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileStore>,
    cache: Arc<dyn ObjectCache>,
}

impl DirectoryService {
    pub fn new(
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileStore>,
        cache: Arc<dyn ObjectCache>,
    ) -> Self {
        Self {
            storage,
            files,
            cache,
        }
    }

    pub async fn create_group(&self, user: &User, req: CreateGroupRequest) -> Result<Group> {
        groups::create_group(self, user, req).await
    }

    pub async fn list_groups(&self, user: &User) -> Result<Vec<Group>> {
        groups::list_groups(self, user).await
    }

    pub async fn get_group(&self, user: &User, group_id: i64) -> Result<GroupDetailResponse> {
        groups::get_group(self, user, group_id).await
    }

    pub async fn update_group(
        &self,
        user: &User,
        group_id: i64,
        req: UpdateGroupRequest,
    ) -> Result<Group> {
        groups::update_group(self, user, group_id, req).await
    }

    pub async fn delete_group(&self, user: &User, group_id: i64) -> Result<()> {
        groups::delete_group(self, user, group_id).await
    }

    pub async fn create_student(
        &self,
        user: &User,
        req: CreateStudentRequest,
    ) -> Result<StudentCreatedResponse> {
        students::create_student(self, user, req).await
    }

    pub async fn list_students(&self, user: &User, group_id: Option<i64>) -> Result<Vec<Student>> {
        students::list_students(self, user, group_id).await
    }

    pub async fn get_student(&self, user: &User, student_id: i64) -> Result<StudentDetailResponse> {
        students::get_student(self, user, student_id).await
    }

    pub async fn list_student_homeworks(
        &self,
        user: &User,
        student_id: i64,
    ) -> Result<Vec<HomeworkListItem>> {
        students::list_student_homeworks(self, user, student_id).await
    }

    pub async fn update_student(
        &self,
        user: &User,
        student_id: i64,
        req: UpdateStudentRequest,
    ) -> Result<Student> {
        students::update_student(self, user, student_id, req).await
    }

    pub async fn set_student_group(
        &self,
        user: &User,
        student_id: i64,
        req: SetStudentGroupRequest,
    ) -> Result<Student> {
        students::set_student_group(self, user, student_id, req).await
    }

    pub async fn delete_student(&self, user: &User, student_id: i64) -> Result<()> {
        students::delete_student(self, user, student_id).await
    }

    /// 读取小组并确认归属
    pub(crate) async fn owned_group(&self, user: &User, group_id: i64) -> Result<Group> {
        let group = self
            .storage
            .get_group_by_id(group_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("group {group_id} not found")))?;

        if group.teacher_id != user.id {
            return Err(HWSystemError::authorization(format!(
                "group {group_id} belongs to another teacher"
            )));
        }
        Ok(group)
    }

    /// 读取学生并确认归属
    pub(crate) async fn owned_student(&self, user: &User, student_id: i64) -> Result<Student> {
        let student = self
            .storage
            .get_student_by_id(student_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("student {student_id} not found")))?;

        if student.teacher_id != user.id {
            return Err(HWSystemError::authorization(format!(
                "student {student_id} belongs to another teacher"
            )));
        }
        Ok(student)
    }
}

fn require_teacher(user: &User) -> Result<()> {
    if user.is_teacher() {
        Ok(())
    } else {
        Err(HWSystemError::authorization(
            "only teachers can manage groups and students",
        ))
    }
}

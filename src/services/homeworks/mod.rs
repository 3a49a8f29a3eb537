pub mod create;
pub mod delete;
pub mod detail;
pub mod list;
pub mod update;

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::AssignmentSpec;
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::{
    entities::{Audience, Homework},
    requests::{AssignmentInput, CreateHomeworkRequest, UpdateHomeworkRequest},
    responses::{HomeworkDetailResponse, HomeworkListResponse, HomeworkProgress},
};
use crate::models::users::entities::User;
use crate::services::files::{purge_paths, resolve_upload};
use crate::storage::{FileStore, Storage};
use crate::utils::validate::validate_link;

pub struct HomeworkService {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileStore>,
}

impl HomeworkService {
    pub fn new(storage: Arc<dyn Storage>, files: Arc<dyn FileStore>) -> Self {
        Self { storage, files }
    }

    pub async fn create_homework(
        &self,
        user: &User,
        req: CreateHomeworkRequest,
    ) -> Result<Homework> {
        create::create_homework(self, user, req).await
    }

    pub async fn update_homework(
        &self,
        user: &User,
        homework_id: i64,
        req: UpdateHomeworkRequest,
    ) -> Result<Homework> {
        update::update_homework(self, user, homework_id, req).await
    }

    pub async fn delete_homework(&self, user: &User, homework_id: i64) -> Result<()> {
        delete::delete_homework(self, user, homework_id).await
    }

    pub async fn list_homeworks(&self, user: &User) -> Result<HomeworkListResponse> {
        list::list_homeworks(self, user).await
    }

    pub async fn get_homework(
        &self,
        user: &User,
        homework_id: i64,
    ) -> Result<HomeworkDetailResponse> {
        detail::get_homework(self, user, homework_id).await
    }

    /// 读取作业并确认归属
    pub(crate) async fn owned_homework(&self, user: &User, homework_id: i64) -> Result<Homework> {
        let homework = self
            .storage
            .get_homework_by_id(homework_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("homework {homework_id} not found")))?;

        if homework.teacher_id != user.id {
            return Err(HWSystemError::authorization(format!(
                "homework {homework_id} belongs to another teacher"
            )));
        }
        Ok(homework)
    }

    /// 校验作业对象：小组或学生必须属于当前教师，学生 id 去重
    pub(crate) async fn validate_audience(
        &self,
        teacher_id: i64,
        audience: Audience,
    ) -> Result<Audience> {
        match audience {
            Audience::Group { group_id } => {
                let owned = self
                    .storage
                    .get_group_by_id(group_id)
                    .await?
                    .is_some_and(|g| g.teacher_id == teacher_id);
                if !owned {
                    return Err(HWSystemError::invalid_field(
                        "audience.group_id",
                        format!("group {group_id} is not one of your groups"),
                    ));
                }
                Ok(Audience::Group { group_id })
            }
            Audience::Individual { student_ids } => {
                let mut seen = HashSet::new();
                let student_ids: Vec<i64> =
                    student_ids.into_iter().filter(|id| seen.insert(*id)).collect();

                if student_ids.is_empty() {
                    return Err(HWSystemError::invalid_field(
                        "audience.student_ids",
                        "at least one student is required",
                    ));
                }

                let students = self.storage.get_students_by_ids(&student_ids).await?;
                for id in &student_ids {
                    let owned = students
                        .iter()
                        .any(|s| s.id == *id && s.teacher_id == teacher_id);
                    if !owned {
                        return Err(HWSystemError::invalid_field(
                            "audience.student_ids",
                            format!("student {id} is not one of your students"),
                        ));
                    }
                }
                Ok(Audience::Individual { student_ids })
            }
        }
    }

    /// 将小题中的上传凭证解析为附件
    pub(crate) async fn resolve_assignments(
        &self,
        teacher_id: i64,
        inputs: Vec<AssignmentInput>,
    ) -> Result<Vec<AssignmentSpec>> {
        let mut specs = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            let mut images = Vec::with_capacity(input.attachments.len());
            for (slot, token) in input.attachments.iter().enumerate() {
                let field = format!("assignments[{index}].attachments[{slot}]");
                let upload = resolve_upload(self.storage.as_ref(), token, teacher_id, &field).await?;
                images.push(upload.to_attachment());
            }
            specs.push(AssignmentSpec {
                id: input.id,
                name: input.name,
                images,
            });
        }
        Ok(specs)
    }

    /// 清理本人上传的文件，用于失败后的补偿
    pub(crate) async fn purge_tokens(&self, owner_id: i64, tokens: Vec<String>) {
        let mut paths = Vec::new();
        for token in tokens {
            match self.storage.get_upload_by_token(&token).await {
                Ok(Some(upload)) if upload.uploader_id == owner_id => paths.push(upload.storage_path),
                Ok(_) => {}
                Err(e) => tracing::warn!("查询待清理的上传记录失败 {}: {}", token, e),
            }
        }
        self.purge(paths).await;
    }

    pub(crate) async fn purge(&self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        purge_paths(self.storage.as_ref(), self.files.as_ref(), paths).await;
    }

    /// 统计作业进度
    pub(crate) async fn progress(&self, homework: &Homework) -> Result<HomeworkProgress> {
        let audience_size = match &homework.audience {
            Audience::Group { group_id } => self.storage.count_students_in_group(*group_id).await? as i64,
            Audience::Individual { student_ids } => student_ids.len() as i64,
        };
        let counts = self.storage.count_submissions(homework.id).await?;

        Ok(HomeworkProgress {
            audience_size,
            submitted_count: counts.submitted,
            reviewed_count: counts.reviewed,
        })
    }

    /// 补全附件访问地址
    pub(crate) fn present(&self, homework: Homework) -> Homework {
        homework.with_urls(|path| self.files.url_for(path))
    }
}

/// 校验并规范化链接，空白视为未填写
pub(crate) fn normalize_link(link: Option<String>) -> Result<Option<String>> {
    match link.map(|l| l.trim().to_string()) {
        Some(l) if l.is_empty() => Ok(None),
        Some(l) => {
            validate_link(&l).map_err(|reason| HWSystemError::invalid_field("link", reason))?;
            Ok(Some(l))
        }
        None => Ok(None),
    }
}

/// 请求中引用的全部上传凭证
pub(crate) fn referenced_tokens(inputs: &[AssignmentInput]) -> Vec<String> {
    inputs
        .iter()
        .flat_map(|a| a.attachments.iter().cloned())
        .collect()
}

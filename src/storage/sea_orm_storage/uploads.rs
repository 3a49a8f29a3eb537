//! 上传记录存储操作

use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::homeworks::{Column as HomeworkColumn, Entity as Homeworks};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::entity::uploads::{ActiveModel, Column, Entity as Uploads};
use crate::errors::{HWSystemError, Result};
use crate::models::{
    files::entities::Upload, homeworks::entities::Assignment, submissions::entities::Answer,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 登记上传文件
    pub async fn record_upload_impl(&self, upload: Upload) -> Result<Upload> {
        let model = ActiveModel {
            token: Set(upload.token),
            uploader_id: Set(upload.uploader_id),
            category: Set(upload.category.to_string()),
            filename: Set(upload.filename),
            storage_path: Set(upload.storage_path),
            mime_type: Set(upload.mime_type),
            size_bytes: Set(upload.size_bytes),
            uploaded_at: Set(upload.uploaded_at.timestamp()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("登记上传文件失败: {e}")))?;

        result.into_upload()
    }

    /// 通过凭证获取上传记录
    pub async fn get_upload_by_token_impl(&self, token: &str) -> Result<Option<Upload>> {
        let result = Uploads::find_by_id(token.to_string())
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询上传记录失败: {e}")))?;

        result.map(|m| m.into_upload()).transpose()
    }

    /// 早于 cutoff 的上传记录，旧的在前
    pub async fn list_uploads_before_impl(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Upload>> {
        let models = Uploads::find()
            .filter(Column::UploadedAt.lt(cutoff.timestamp()))
            .order_by_asc(Column::UploadedAt)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询上传记录失败: {e}")))?;

        models.into_iter().map(|m| m.into_upload()).collect()
    }

    /// 作业附件与答案文件当前引用的全部存储路径
    pub async fn referenced_upload_paths_impl(&self) -> Result<HashSet<String>> {
        let mut paths = HashSet::new();

        let assignment_columns: Vec<String> = Homeworks::find()
            .select_only()
            .column(HomeworkColumn::Assignments)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业附件失败: {e}")))?;
        for raw in assignment_columns {
            let assignments: Vec<Assignment> = serde_json::from_str(&raw)?;
            paths.extend(
                assignments
                    .into_iter()
                    .flat_map(|a| a.images)
                    .map(|image| image.storage_path),
            );
        }

        let answer_columns: Vec<String> = Submissions::find()
            .select_only()
            .column(SubmissionColumn::Answers)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询答案文件失败: {e}")))?;
        for raw in answer_columns {
            let answers: Vec<Answer> = serde_json::from_str(&raw)?;
            paths.extend(
                answers
                    .into_iter()
                    .filter_map(|a| a.file_reference)
                    .map(|file| file.storage_path),
            );
        }

        Ok(paths)
    }

    /// 删除上传记录
    pub async fn delete_upload_by_path_impl(&self, storage_path: &str) -> Result<bool> {
        let result = Uploads::delete_many()
            .filter(Column::StoragePath.eq(storage_path))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除上传记录失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

//! 上传文件实体

use sea_orm::entity::prelude::*;

use crate::errors::HWSystemError;
use crate::models::files::entities::Upload;
use crate::models::homeworks::entities::HomeworkCategory;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "uploads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub uploader_id: i64,
    pub category: String,
    pub filename: String,
    #[sea_orm(unique)]
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub uploaded_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UploaderId",
        to = "super::users::Column::Id"
    )]
    Uploader,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_upload(self) -> crate::errors::Result<Upload> {
        let category = self
            .category
            .parse::<HomeworkCategory>()
            .map_err(HWSystemError::serialization)?;

        Ok(Upload {
            token: self.token,
            uploader_id: self.uploader_id,
            category,
            filename: self.filename,
            storage_path: self.storage_path,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            uploaded_at: super::from_timestamp(self.uploaded_at),
        })
    }
}

use serde::Deserialize;
use ts_rs::TS;

use crate::models::homeworks::entities::HomeworkCategory;

/// 上传查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct UploadQuery {
    pub category: HomeworkCategory,
}

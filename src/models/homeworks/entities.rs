use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::files::entities::Attachment;
use crate::models::submissions::entities::ReviewDecision;

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md",
];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "aac"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv"];
const TEXT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "pdf", "doc", "docx", "xls", "xlsx", "ppt",
    "pptx", "txt", "md",
];
const FILE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "pdf", "doc", "docx", "xls", "xlsx", "ppt",
    "pptx", "txt", "md", "mp3", "wav", "ogg", "m4a", "aac", "mp4", "webm", "mov", "avi", "mkv",
    "zip", "rar", "7z", "gz", "tar", "csv", "json",
];

/// 作业类别，同时决定允许的文件扩展名与存储子目录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "homework.ts")]
pub enum HomeworkCategory {
    Text,
    Audio,
    Video,
    Photo,
    File,
    Document,
}

impl HomeworkCategory {
    pub const ALL: [HomeworkCategory; 6] = [
        HomeworkCategory::Text,
        HomeworkCategory::Audio,
        HomeworkCategory::Video,
        HomeworkCategory::Photo,
        HomeworkCategory::File,
        HomeworkCategory::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkCategory::Text => "TEXT",
            HomeworkCategory::Audio => "AUDIO",
            HomeworkCategory::Video => "VIDEO",
            HomeworkCategory::Photo => "PHOTO",
            HomeworkCategory::File => "FILE",
            HomeworkCategory::Document => "DOCUMENT",
        }
    }

    /// 允许的扩展名（小写，不含点）
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            HomeworkCategory::Text => TEXT_EXTENSIONS,
            HomeworkCategory::Audio => AUDIO_EXTENSIONS,
            HomeworkCategory::Video => VIDEO_EXTENSIONS,
            HomeworkCategory::Photo => PHOTO_EXTENSIONS,
            HomeworkCategory::File => FILE_EXTENSIONS,
            HomeworkCategory::Document => DOCUMENT_EXTENSIONS,
        }
    }

    /// 上传根目录下的子目录
    pub fn storage_subdir(&self) -> &'static str {
        match self {
            HomeworkCategory::Text => "text",
            HomeworkCategory::Audio => "audio",
            HomeworkCategory::Video => "video",
            HomeworkCategory::Photo => "photo",
            HomeworkCategory::File => "file",
            HomeworkCategory::Document => "document",
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.allowed_extensions().contains(&ext.as_str())
    }

    /// 文本类作业的答案必须是文字
    pub fn requires_text_answer(&self) -> bool {
        matches!(self, HomeworkCategory::Text)
    }
}

impl std::fmt::Display for HomeworkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HomeworkCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HomeworkCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Invalid homework category: {s}"))
    }
}

/// 布置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "homework.ts")]
pub enum AssignmentType {
    Group,
    Individual,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::Group => "GROUP",
            AssignmentType::Individual => "INDIVIDUAL",
        }
    }
}

impl std::str::FromStr for AssignmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GROUP" => Ok(AssignmentType::Group),
            "INDIVIDUAL" => Ok(AssignmentType::Individual),
            _ => Err(format!("Invalid assignment type: {s}")),
        }
    }
}

/// 作业状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "homework.ts")]
pub enum HomeworkStatus {
    New,
    Pending,
    Reviewed,
}

impl HomeworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::New => "NEW",
            HomeworkStatus::Pending => "PENDING",
            HomeworkStatus::Reviewed => "REVIEWED",
        }
    }
}

impl std::str::FromStr for HomeworkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(HomeworkStatus::New),
            "PENDING" => Ok(HomeworkStatus::Pending),
            "REVIEWED" => Ok(HomeworkStatus::Reviewed),
            _ => Err(format!("Invalid homework status: {s}")),
        }
    }
}

/// 作业对象：整个小组，或指定的若干学生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "homework.ts")]
pub enum Audience {
    Group { group_id: i64 },
    Individual { student_ids: Vec<i64> },
}

impl Audience {
    pub fn assignment_type(&self) -> AssignmentType {
        match self {
            Audience::Group { .. } => AssignmentType::Group,
            Audience::Individual { .. } => AssignmentType::Individual,
        }
    }

    pub fn group_id(&self) -> Option<i64> {
        match self {
            Audience::Group { group_id } => Some(*group_id),
            Audience::Individual { .. } => None,
        }
    }

    pub fn student_ids(&self) -> &[i64] {
        match self {
            Audience::Group { .. } => &[],
            Audience::Individual { student_ids } => student_ids,
        }
    }

    /// 只有一名学生的单独布置，提交与批改会回写作业状态
    pub fn is_single_recipient(&self) -> bool {
        matches!(self, Audience::Individual { student_ids } if student_ids.len() == 1)
    }
}

/// 作业中的一道小题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct Assignment {
    // 稳定标识，更新作业时保留
    pub id: String,
    pub name: String,
    // 参考附件
    #[serde(default)]
    pub images: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct Homework {
    pub id: i64,
    // 布置作业的教师
    pub teacher_id: i64,
    pub description: String,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub category: HomeworkCategory,
    // 外部链接
    pub link: Option<String>,
    pub audience: Audience,
    pub assignments: Vec<Assignment>,
    pub status: HomeworkStatus,
    // 单独布置作业的批改结果
    pub review_outcome: Option<ReviewDecision>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Homework {
    pub fn assignment_type(&self) -> AssignmentType {
        self.audience.assignment_type()
    }

    pub fn find_assignment(&self, assignment_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == assignment_id)
    }

    /// 作业引用的全部附件
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.assignments.iter().flat_map(|a| a.images.iter())
    }

    /// 为附件补全访问地址
    pub fn with_urls(mut self, resolve: impl Fn(&str) -> String) -> Self {
        for assignment in &mut self.assignments {
            assignment.images = std::mem::take(&mut assignment.images)
                .into_iter()
                .map(|image| image.with_url(&resolve))
                .collect();
        }
        self
    }
}

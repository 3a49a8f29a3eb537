//! 提交实体

use sea_orm::entity::prelude::*;

use crate::errors::HWSystemError;
use crate::models::submissions::entities::{Answer, Submission, SubmissionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub homework_id: i64,
    pub student_id: i64,
    // 答案列表（JSON）
    #[sea_orm(column_type = "Text")]
    pub answers: String,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub teacher_comment: Option<String>,
    pub submitted_at: i64,
    pub reviewed_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::homeworks::Entity",
        from = "Column::HomeworkId",
        to = "super::homeworks::Column::Id"
    )]
    Homework,
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
}

impl Related<super::homeworks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Homework.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_submission(self) -> crate::errors::Result<Submission> {
        let status = self
            .status
            .parse::<SubmissionStatus>()
            .map_err(HWSystemError::serialization)?;
        let answers: Vec<Answer> = serde_json::from_str(&self.answers)?;

        Ok(Submission {
            id: self.id,
            homework_id: self.homework_id,
            student_id: self.student_id,
            answers,
            status,
            teacher_comment: self.teacher_comment,
            submitted_at: super::from_timestamp(self.submitted_at),
            reviewed_at: self.reviewed_at.map(super::from_timestamp),
        })
    }
}

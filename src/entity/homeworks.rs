//! 作业实体

use sea_orm::entity::prelude::*;

use crate::errors::HWSystemError;
use crate::models::homeworks::entities::{
    Assignment, AssignmentType, Audience, Homework, HomeworkCategory, HomeworkStatus,
};
use crate::models::submissions::entities::ReviewDecision;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "homeworks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub teacher_id: i64,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub deadline: Option<i64>,
    pub category: String,
    pub link: Option<String>,
    pub assignment_type: String,
    pub group_id: Option<i64>,
    // 小题列表（JSON）
    #[sea_orm(column_type = "Text")]
    pub assignments: String,
    pub status: String,
    pub review_outcome: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::homework_students::Entity")]
    HomeworkStudents,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::homework_students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HomeworkStudents.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    /// `student_ids` 来自 homework_students 表，仅单独布置的作业使用
    pub fn into_homework(self, student_ids: Vec<i64>) -> crate::errors::Result<Homework> {
        let category = self
            .category
            .parse::<HomeworkCategory>()
            .map_err(HWSystemError::serialization)?;
        let assignment_type = self
            .assignment_type
            .parse::<AssignmentType>()
            .map_err(HWSystemError::serialization)?;
        let status = self
            .status
            .parse::<HomeworkStatus>()
            .map_err(HWSystemError::serialization)?;
        let review_outcome = self
            .review_outcome
            .map(|s| s.parse::<ReviewDecision>())
            .transpose()
            .map_err(HWSystemError::serialization)?;
        let assignments: Vec<Assignment> = serde_json::from_str(&self.assignments)?;

        let audience = match (assignment_type, self.group_id) {
            (AssignmentType::Group, Some(group_id)) => Audience::Group { group_id },
            (AssignmentType::Group, None) => {
                return Err(HWSystemError::serialization(format!(
                    "homework {} is GROUP but has no group_id",
                    self.id
                )));
            }
            (AssignmentType::Individual, _) => Audience::Individual { student_ids },
        };

        Ok(Homework {
            id: self.id,
            teacher_id: self.teacher_id,
            description: self.description,
            deadline: self.deadline.map(super::from_timestamp),
            category,
            link: self.link,
            audience,
            assignments,
            status,
            review_outcome,
            created_at: super::from_timestamp(self.created_at),
            updated_at: super::from_timestamp(self.updated_at),
        })
    }
}

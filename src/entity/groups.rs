//! 小组实体

use sea_orm::entity::prelude::*;

use crate::models::directory::entities::{Group, GroupSchedule, Weekday};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub teacher_id: i64,
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    // JSON 数组，如 ["Monday","Wednesday"]
    #[sea_orm(column_type = "Text")]
    pub days_of_week: String,
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
    #[sea_orm(has_many = "super::students::Entity")]
    Students,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_group(self) -> crate::errors::Result<Group> {
        let days_of_week: Vec<Weekday> = serde_json::from_str(&self.days_of_week)?;

        Ok(Group {
            id: self.id,
            teacher_id: self.teacher_id,
            name: self.name,
            schedule: GroupSchedule {
                start_time: self.start_time,
                end_time: self.end_time,
                days_of_week,
            },
            created_at: super::from_timestamp(self.created_at),
            updated_at: super::from_timestamp(self.updated_at),
        })
    }
}

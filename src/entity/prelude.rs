//! 预导入模块，方便使用

pub use super::groups::{ActiveModel as GroupActiveModel, Entity as Groups, Model as GroupModel};
pub use super::homework_students::{
    ActiveModel as HomeworkStudentActiveModel, Entity as HomeworkStudents,
    Model as HomeworkStudentModel,
};
pub use super::homeworks::{
    ActiveModel as HomeworkActiveModel, Entity as Homeworks, Model as HomeworkModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::uploads::{ActiveModel as UploadActiveModel, Entity as Uploads, Model as UploadModel};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};

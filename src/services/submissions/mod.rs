pub mod detail;
pub mod review;
pub mod submit;

use std::sync::Arc;

use crate::errors::Result;
use crate::models::submissions::{
    entities::Submission,
    requests::{ReviewSubmissionRequest, SubmitHomeworkRequest},
};
use crate::models::users::entities::User;
use crate::storage::{FileStore, Storage};

pub struct SubmissionService {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileStore>,
}

impl SubmissionService {
    pub fn new(storage: Arc<dyn Storage>, files: Arc<dyn FileStore>) -> Self {
        Self { storage, files }
    }

    // 学生提交作业
    pub async fn submit_homework(
        &self,
        user: &User,
        homework_id: i64,
        req: SubmitHomeworkRequest,
    ) -> Result<Submission> {
        submit::submit_homework(self, user, homework_id, req).await
    }

    // 教师批改
    pub async fn review_submission(
        &self,
        user: &User,
        submission_id: i64,
        req: ReviewSubmissionRequest,
    ) -> Result<Submission> {
        review::review_submission(self, user, submission_id, req).await
    }

    pub async fn get_submission(&self, user: &User, submission_id: i64) -> Result<Submission> {
        detail::get_submission(self, user, submission_id).await
    }

    pub(crate) fn present(&self, submission: Submission) -> Submission {
        submission.with_urls(|path| self.files.url_for(path))
    }
}

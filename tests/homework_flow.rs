//! 作业布置、提交与批改的端到端流程
//!
//! 业务服务直接运行在内存 SQLite 上，上传文件保存在内存中。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use homework_tracker::cache::{
    CacheResult, MokaCacheWrapper, ObjectCache, insert_json, user_cache_key,
};
use homework_tracker::config::{CacheConfig, DatabaseConfig, MemoryConfig};
use homework_tracker::errors::{ErrorKind, HWSystemError, Result};
use homework_tracker::models::{
    directory::{
        entities::{Group, GroupSchedule, Student, Weekday},
        requests::{
            CreateGroupRequest, CreateStudentRequest, NewStudent, UpdateGroupRequest,
            UpdateStudentRequest,
        },
    },
    files::entities::{StoredFile, Upload},
    homeworks::{
        entities::{Audience, Homework, HomeworkCategory, HomeworkStatus},
        requests::{AssignmentInput, CreateHomeworkRequest, HomeworkDraft, UpdateHomeworkRequest},
    },
    submissions::{
        entities::{Answer, ReviewDecision, SubmissionStatus},
        requests::{
            AnswerInput, NewSubmission, ReviewSubmissionRequest, SubmitHomeworkRequest,
        },
    },
    users::{
        entities::{User, UserRole},
        requests::CreateUserRequest,
    },
};
use homework_tracker::services::auth::{ProvisionOutcome, provision_teacher};
use homework_tracker::services::files::sweep_orphan_uploads;
use homework_tracker::services::{
    DirectoryService, FileService, HomeworkService, SubmissionService,
};
use homework_tracker::storage::file_store::extension_of;
use homework_tracker::storage::sea_orm_storage::SeaOrmStorage;
use homework_tracker::storage::{FileStore, Storage};
use homework_tracker::utils::file_magic::mime_type_for;
use homework_tracker::utils::password::verify_password;

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
const MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00";

#[derive(Default)]
struct MemoryFileStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }
}

#[async_trait::async_trait]
impl FileStore for MemoryFileStore {
    async fn save(
        &self,
        category: HomeworkCategory,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile> {
        let extension = extension_of(original_name).unwrap_or_default();
        let storage_path = format!(
            "{}/{}.{extension}",
            category.storage_subdir(),
            uuid::Uuid::new_v4()
        );
        self.blobs
            .lock()
            .unwrap()
            .insert(storage_path.clone(), data.to_vec());

        Ok(StoredFile {
            filename: original_name.to_string(),
            storage_path,
            mime_type: mime_type_for(&extension).to_string(),
            size_bytes: data.len() as i64,
        })
    }

    async fn remove(&self, storage_path: &str) -> Result<()> {
        self.blobs.lock().unwrap().remove(storage_path);
        Ok(())
    }

    fn url_for(&self, storage_path: &str) -> String {
        format!("/uploads/{storage_path}")
    }
}

struct Env {
    storage: Arc<dyn Storage>,
    files: Arc<MemoryFileStore>,
    cache: Arc<dyn ObjectCache>,
    homeworks: HomeworkService,
    submissions: SubmissionService,
    directory: DirectoryService,
    uploads: FileService,
    teacher: User,
}

async fn memory_storage() -> Arc<dyn Storage> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
        pool_size: 1,
        timeout: 5,
    };
    Arc::new(SeaOrmStorage::connect(&config).await.unwrap())
}

async fn setup() -> Env {
    let storage = memory_storage().await;
    let files = Arc::new(MemoryFileStore::default());
    let file_store: Arc<dyn FileStore> = files.clone();
    let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::new(&CacheConfig {
        default_ttl: 60,
        memory: MemoryConfig { max_capacity: 100 },
    }));

    let teacher = create_teacher(&storage, "teacher").await;

    Env {
        homeworks: HomeworkService::new(storage.clone(), file_store.clone()),
        submissions: SubmissionService::new(storage.clone(), file_store.clone()),
        directory: DirectoryService::new(storage.clone(), file_store.clone(), cache.clone()),
        uploads: FileService::new(storage.clone(), file_store, 1024 * 1024),
        storage,
        files,
        cache,
        teacher,
    }
}

async fn create_teacher(storage: &Arc<dyn Storage>, username: &str) -> User {
    storage
        .create_user(CreateUserRequest {
            username: username.to_string(),
            password_hash: "not-used".to_string(),
            role: UserRole::Teacher,
            full_name: username.to_string(),
        })
        .await
        .unwrap()
}

async fn create_group(env: &Env, name: &str) -> Group {
    env.storage
        .create_group(env.teacher.id, name, GroupSchedule::default())
        .await
        .unwrap()
}

async fn create_student(
    env: &Env,
    teacher: &User,
    username: &str,
    group_id: Option<i64>,
) -> (Student, User) {
    env.storage
        .create_student(
            teacher.id,
            NewStudent {
                full_name: username.to_string(),
                phone: None,
                group_id,
                username: username.to_string(),
                password_hash: "not-used".to_string(),
            },
        )
        .await
        .unwrap()
}

fn assignment(name: &str) -> AssignmentInput {
    AssignmentInput {
        id: None,
        name: name.to_string(),
        attachments: vec![],
    }
}

fn text_homework(
    audience: Audience,
    names: &[&str],
    deadline: Option<chrono::DateTime<Utc>>,
) -> CreateHomeworkRequest {
    CreateHomeworkRequest {
        description: Some("Read chapter 3".to_string()),
        deadline,
        category: HomeworkCategory::Text,
        link: None,
        audience,
        assignments: names.iter().map(|n| assignment(n)).collect(),
    }
}

fn homework_with_images(audience: Audience, tokens: &[&str]) -> CreateHomeworkRequest {
    CreateHomeworkRequest {
        assignments: vec![AssignmentInput {
            id: None,
            name: "Q1".to_string(),
            attachments: tokens.iter().map(|t| t.to_string()).collect(),
        }],
        ..text_homework(audience, &[], None)
    }
}

/// 登记一份上传时间在 age 之前的文件
async fn aged_upload(env: &Env, owner: &User, name: &str, age: Duration) -> Upload {
    let stored = env
        .files
        .save(HomeworkCategory::Photo, name, PNG)
        .await
        .unwrap();
    env.storage
        .record_upload(Upload {
            token: uuid::Uuid::new_v4().to_string(),
            uploader_id: owner.id,
            category: HomeworkCategory::Photo,
            filename: stored.filename,
            storage_path: stored.storage_path,
            mime_type: stored.mime_type,
            size_bytes: stored.size_bytes,
            uploaded_at: Utc::now() - age,
        })
        .await
        .unwrap()
}

fn answer_all(homework: &Homework) -> SubmitHomeworkRequest {
    SubmitHomeworkRequest {
        answers: homework
            .assignments
            .iter()
            .map(|a| AnswerInput {
                assignment_id: a.id.clone(),
                text_content: Some(format!("answer to {}", a.name)),
                file_token: None,
            })
            .collect(),
    }
}

fn review(decision: &str, comment: Option<&str>) -> ReviewSubmissionRequest {
    ReviewSubmissionRequest {
        decision: decision.to_string(),
        comment: comment.map(str::to_string),
    }
}

#[tokio::test]
async fn test_individual_homework_full_cycle() {
    let env = setup().await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;

    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1", "Q2"],
                Some(Utc::now() + Duration::hours(1)),
            ),
        )
        .await
        .unwrap();
    assert_eq!(homework.status, HomeworkStatus::New);
    assert_eq!(homework.assignments.len(), 2);

    let detail = env.homeworks.get_homework(&s1_user, homework.id).await.unwrap();
    assert_eq!(detail.can_submit, Some(true));
    assert!(detail.submission.is_none());

    // 提交两道小题
    let submission = env
        .submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Pending);
    assert_eq!(submission.answers.len(), 2);
    assert_eq!(submission.answers[0].assignment_name, "Q1");

    let after_submit = env
        .storage
        .get_homework_by_id(homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_submit.status, HomeworkStatus::Pending);

    // 重复提交
    let err = env
        .submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap_err();
    assert!(matches!(err, HWSystemError::AlreadySubmitted(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // 批改
    let reviewed = env
        .submissions
        .review_submission(&env.teacher, submission.id, review("approved", Some("good")))
        .await
        .unwrap();
    assert_eq!(reviewed.status, SubmissionStatus::Approved);
    assert_eq!(reviewed.teacher_comment.as_deref(), Some("good"));
    assert!(reviewed.reviewed_at.is_some());

    let after_review = env
        .storage
        .get_homework_by_id(homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_review.status, HomeworkStatus::Reviewed);
    assert_eq!(after_review.review_outcome, Some(ReviewDecision::Approved));

    let detail = env.homeworks.get_homework(&s1_user, homework.id).await.unwrap();
    assert_eq!(detail.can_submit, Some(false));
    assert_eq!(detail.submission.map(|s| s.id), Some(submission.id));
}

#[tokio::test]
async fn test_deadline_passed_blocks_submission() {
    let env = setup().await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;

    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                Some(Utc::now() - Duration::hours(1)),
            ),
        )
        .await
        .unwrap();

    let list = env.homeworks.list_homeworks(&s1_user).await.unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].can_submit, Some(false));

    let err = env
        .submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeadlinePassed);
}

#[tokio::test]
async fn test_storage_rejects_second_submission() {
    let env = setup().await;
    let (s1, _) = create_student(&env, &env.teacher, "s1", None).await;
    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();

    let new_submission = || NewSubmission {
        homework_id: homework.id,
        student_id: s1.id,
        answers: vec![Answer {
            assignment_id: homework.assignments[0].id.clone(),
            assignment_name: "Q1".to_string(),
            text_content: Some("first".to_string()),
            file_reference: None,
        }],
        submitted_at: Utc::now(),
    };

    env.storage
        .create_submission(new_submission(), None)
        .await
        .unwrap();
    let err = env
        .storage
        .create_submission(new_submission(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, HWSystemError::AlreadySubmitted(_)));
}

#[tokio::test]
async fn test_concurrent_submissions_create_one_record() {
    let env = setup().await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;
    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        env.submissions
            .submit_homework(&s1_user, homework.id, answer_all(&homework)),
        env.submissions
            .submit_homework(&s1_user, homework.id, answer_all(&homework)),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

    let stored = env
        .storage
        .list_submissions_by_homework(homework.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_update_is_locked_after_submission() {
    let env = setup().await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;
    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();
    env.submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap();

    let structural_patches = [
        UpdateHomeworkRequest {
            assignments: Some(vec![assignment("Q1"), assignment("Q2")]),
            ..Default::default()
        },
        UpdateHomeworkRequest {
            category: Some(HomeworkCategory::Audio),
            ..Default::default()
        },
        UpdateHomeworkRequest {
            audience: Some(Audience::Individual {
                student_ids: vec![s1.id],
            }),
            ..Default::default()
        },
        UpdateHomeworkRequest {
            deadline: Some(Utc::now() + Duration::days(1)),
            ..Default::default()
        },
    ];
    for patch in structural_patches {
        let err = env
            .homeworks
            .update_homework(&env.teacher, homework.id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::HomeworkLocked(_)));
    }

    // 描述仍可修改
    let updated = env
        .homeworks
        .update_homework(
            &env.teacher,
            homework.id,
            UpdateHomeworkRequest {
                description: Some("Read chapter 4 instead".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "Read chapter 4 instead");
    assert_eq!(updated.assignments, homework.assignments);

    let err = env
        .homeworks
        .delete_homework(&env.teacher, homework.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HWSystemError::HomeworkLocked(_)));

    // 绕过服务层的提交数检查，存储层在事务内仍会拒绝
    let err = env
        .storage
        .update_homework(
            homework.id,
            HomeworkDraft {
                description: homework.description.clone(),
                deadline: None,
                category: HomeworkCategory::Text,
                link: None,
                audience: homework.audience.clone(),
                assignments: Vec::new(),
            },
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HWSystemError::HomeworkLocked(_)));
    let unchanged = env
        .storage
        .get_homework_by_id(homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.assignments, homework.assignments);
}

#[tokio::test]
async fn test_update_preserves_assignment_identity() {
    let env = setup().await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;
    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1", "Q2"],
                None,
            ),
        )
        .await
        .unwrap();
    let q1 = homework.assignments[0].clone();
    let q2 = homework.assignments[1].clone();

    // Q1 名称不变，Q2 通过显式 id 改名，新增 Q3
    let updated = env
        .homeworks
        .update_homework(
            &env.teacher,
            homework.id,
            UpdateHomeworkRequest {
                assignments: Some(vec![
                    assignment("Q1"),
                    AssignmentInput {
                        id: Some(q2.id.clone()),
                        name: "Q2 (revised)".to_string(),
                        attachments: vec![],
                    },
                    assignment("Q3"),
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.assignments.len(), 3);
    assert_eq!(updated.assignments[0].id, q1.id);
    assert_eq!(updated.assignments[1].id, q2.id);
    assert_eq!(updated.assignments[1].name, "Q2 (revised)");
    assert!(updated.assignments[2].id != q1.id && updated.assignments[2].id != q2.id);

    // 按原 id 作答仍能匹配
    let submission = env
        .submissions
        .submit_homework(
            &s1_user,
            homework.id,
            SubmitHomeworkRequest {
                answers: vec![AnswerInput {
                    assignment_id: q1.id.clone(),
                    text_content: Some("still valid".to_string()),
                    file_token: None,
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(submission.answers.len(), 1);
    assert_eq!(submission.answers[0].assignment_id, q1.id);
    assert_eq!(submission.answers[0].assignment_name, "Q1");

    // 未知的显式 id
    let (s2, _) = create_student(&env, &env.teacher, "s2", None).await;
    let other = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s2.id],
                },
                &["A"],
                None,
            ),
        )
        .await
        .unwrap();
    let err = env
        .homeworks
        .update_homework(
            &env.teacher,
            other.id,
            UpdateHomeworkRequest {
                assignments: Some(vec![AssignmentInput {
                    id: Some("no-such-assignment".to_string()),
                    name: "A".to_string(),
                    attachments: vec![],
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_students_outside_audience_are_forbidden() {
    let env = setup().await;
    let group_a = create_group(&env, "A").await;
    let group_b = create_group(&env, "B").await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", Some(group_a.id)).await;
    let (_, s2_user) = create_student(&env, &env.teacher, "s2", Some(group_b.id)).await;

    let individual = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();
    let group = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Group {
                    group_id: group_a.id,
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();

    for homework in [&individual, &group] {
        let err = env
            .homeworks
            .get_homework(&s2_user, homework.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = env
            .submissions
            .submit_homework(&s2_user, homework.id, answer_all(homework))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    // s1 两份作业都可见
    let list = env.homeworks.list_homeworks(&s1_user).await.unwrap();
    assert_eq!(list.items.len(), 2);
    assert!(env.homeworks.list_homeworks(&s2_user).await.unwrap().items.is_empty());

    // 不存在的作业
    let err = env
        .homeworks
        .get_homework(&s1_user, 9999)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_group_homework_status_is_not_back_propagated() {
    let env = setup().await;
    let group = create_group(&env, "A").await;
    let (_, s1_user) = create_student(&env, &env.teacher, "s1", Some(group.id)).await;
    let (_, s2_user) = create_student(&env, &env.teacher, "s2", Some(group.id)).await;

    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(Audience::Group { group_id: group.id }, &["Q1"], None),
        )
        .await
        .unwrap();

    let first = env
        .submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap();
    // 第一份提交不影响其他学生
    let detail = env.homeworks.get_homework(&s2_user, homework.id).await.unwrap();
    assert_eq!(detail.can_submit, Some(true));

    env.submissions
        .review_submission(&env.teacher, first.id, review("REJECTED", None))
        .await
        .unwrap();

    let stored = env
        .storage
        .get_homework_by_id(homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, HomeworkStatus::New);

    let teacher_view = env
        .homeworks
        .get_homework(&env.teacher, homework.id)
        .await
        .unwrap();
    let progress = teacher_view.progress.unwrap();
    assert_eq!(progress.audience_size, 2);
    assert_eq!(progress.submitted_count, 1);
    assert_eq!(progress.reviewed_count, 1);
    assert_eq!(teacher_view.students.map(|s| s.len()), Some(2));
}

#[tokio::test]
async fn test_review_rules() {
    let env = setup().await;
    let other_teacher = create_teacher(&env.storage, "other").await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;
    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();
    let submission = env
        .submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap();

    let err = env
        .submissions
        .review_submission(&other_teacher, submission.id, review("APPROVED", None))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = env
        .submissions
        .review_submission(&env.teacher, submission.id, review("MAYBE", None))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = env
        .submissions
        .review_submission(&env.teacher, 9999, review("APPROVED", None))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // 再次批改覆盖结论，未给出评语时保留原评语
    env.submissions
        .review_submission(&env.teacher, submission.id, review("REJECTED", Some("redo Q1")))
        .await
        .unwrap();
    let corrected = env
        .submissions
        .review_submission(&env.teacher, submission.id, review("APPROVED", None))
        .await
        .unwrap();
    assert_eq!(corrected.status, SubmissionStatus::Approved);
    assert_eq!(corrected.teacher_comment.as_deref(), Some("redo Q1"));

    let err = env
        .submissions
        .get_submission(&other_teacher, submission.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(env.submissions.get_submission(&s1_user, submission.id).await.is_ok());
}

#[tokio::test]
async fn test_failed_create_purges_uploaded_attachments() {
    let env = setup().await;
    let (s1, _) = create_student(&env, &env.teacher, "s1", None).await;

    let upload = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "diagram.png", PNG)
        .await
        .unwrap();
    assert!(upload.storage_path.starts_with("photo/"));
    assert!(env.files.contains(&upload.storage_path));

    let err = env
        .homeworks
        .create_homework(
            &env.teacher,
            CreateHomeworkRequest {
                assignments: vec![
                    AssignmentInput {
                        id: None,
                        name: "Q1".to_string(),
                        attachments: vec![upload.token.clone()],
                    },
                    assignment("   "),
                ],
                ..text_homework(
                    Audience::Individual {
                        student_ids: vec![s1.id],
                    },
                    &[],
                    None,
                )
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.message().starts_with("assignments[1].name"));

    assert!(!env.files.contains(&upload.storage_path));
    assert!(
        env.storage
            .get_upload_by_token(&upload.token)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_update_purges_dropped_attachments() {
    let env = setup().await;
    let (s1, _) = create_student(&env, &env.teacher, "s1", None).await;
    let first = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "a.png", PNG)
        .await
        .unwrap();
    let second = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "b.png", PNG)
        .await
        .unwrap();

    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            CreateHomeworkRequest {
                assignments: vec![AssignmentInput {
                    id: None,
                    name: "Q1".to_string(),
                    attachments: vec![first.token.clone()],
                }],
                ..text_homework(
                    Audience::Individual {
                        student_ids: vec![s1.id],
                    },
                    &[],
                    None,
                )
            },
        )
        .await
        .unwrap();
    assert_eq!(
        homework.assignments[0].images[0].url.as_deref(),
        Some(format!("/uploads/{}", first.storage_path).as_str())
    );

    let updated = env
        .homeworks
        .update_homework(
            &env.teacher,
            homework.id,
            UpdateHomeworkRequest {
                assignments: Some(vec![AssignmentInput {
                    id: None,
                    name: "Q1".to_string(),
                    attachments: vec![second.token.clone()],
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.assignments[0].id, homework.assignments[0].id);
    assert!(!env.files.contains(&first.storage_path));
    assert!(env.files.contains(&second.storage_path));

    env.homeworks
        .delete_homework(&env.teacher, homework.id)
        .await
        .unwrap();
    assert!(!env.files.contains(&second.storage_path));
    let err = env
        .homeworks
        .get_homework(&env.teacher, homework.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_shared_attachment_survives_purges() {
    let env = setup().await;
    let (s1, _) = create_student(&env, &env.teacher, "s1", None).await;
    let audience = Audience::Individual {
        student_ids: vec![s1.id],
    };
    let shared = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "shared.png", PNG)
        .await
        .unwrap();

    let first = env
        .homeworks
        .create_homework(
            &env.teacher,
            homework_with_images(audience.clone(), &[shared.token.as_str()]),
        )
        .await
        .unwrap();

    // 失败的创建不能删掉其他作业仍在使用的附件
    let err = env
        .homeworks
        .create_homework(
            &env.teacher,
            CreateHomeworkRequest {
                assignments: vec![
                    AssignmentInput {
                        id: None,
                        name: "Q1".to_string(),
                        attachments: vec![shared.token.clone()],
                    },
                    assignment("  "),
                ],
                ..text_homework(audience.clone(), &[], None)
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(env.files.contains(&shared.storage_path));
    assert!(
        env.storage
            .get_upload_by_token(&shared.token)
            .await
            .unwrap()
            .is_some()
    );

    // 删除共用附件的另一份作业同样保留文件
    let second = env
        .homeworks
        .create_homework(
            &env.teacher,
            homework_with_images(audience, &[shared.token.as_str()]),
        )
        .await
        .unwrap();
    env.homeworks
        .delete_homework(&env.teacher, second.id)
        .await
        .unwrap();
    assert!(env.files.contains(&shared.storage_path));

    let detail = env
        .homeworks
        .get_homework(&env.teacher, first.id)
        .await
        .unwrap();
    assert_eq!(
        detail.homework.assignments[0].images[0].storage_path,
        shared.storage_path
    );

    // 最后一个引用移除后才清理
    env.homeworks
        .update_homework(
            &env.teacher,
            first.id,
            UpdateHomeworkRequest {
                assignments: Some(vec![AssignmentInput {
                    id: Some(first.assignments[0].id.clone()),
                    name: "Q1".to_string(),
                    attachments: vec![],
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!env.files.contains(&shared.storage_path));
    assert!(
        env.storage
            .get_upload_by_token(&shared.token)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_sweep_removes_only_old_unreferenced_uploads() {
    let env = setup().await;
    let (s1, _) = create_student(&env, &env.teacher, "s1", None).await;

    let orphan = aged_upload(&env, &env.teacher, "orphan.png", Duration::hours(48)).await;
    let attached = aged_upload(&env, &env.teacher, "attached.png", Duration::hours(48)).await;
    let fresh = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "fresh.png", PNG)
        .await
        .unwrap();

    env.homeworks
        .create_homework(
            &env.teacher,
            homework_with_images(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &[attached.token.as_str()],
            ),
        )
        .await
        .unwrap();

    let removed = sweep_orphan_uploads(env.storage.as_ref(), &*env.files, Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    assert!(!env.files.contains(&orphan.storage_path));
    assert!(
        env.storage
            .get_upload_by_token(&orphan.token)
            .await
            .unwrap()
            .is_none()
    );
    assert!(env.files.contains(&attached.storage_path));
    assert!(env.files.contains(&fresh.storage_path));
    assert!(
        env.storage
            .get_upload_by_token(&fresh.token)
            .await
            .unwrap()
            .is_some()
    );

    // 没有可清理的文件时不做任何事
    let removed = sweep_orphan_uploads(env.storage.as_ref(), &*env.files, Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn test_upload_tokens_are_checked() {
    let env = setup().await;
    let other_teacher = create_teacher(&env.storage, "other").await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;

    // 扩展名与内容校验
    let err = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "song.mp3", MP3)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "fake.png", b"not a png")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let foreign = env
        .uploads
        .upload(&other_teacher, HomeworkCategory::Photo, "x.png", PNG)
        .await
        .unwrap();

    let with_token = |token: &str| CreateHomeworkRequest {
        assignments: vec![AssignmentInput {
            id: None,
            name: "Q1".to_string(),
            attachments: vec![token.to_string()],
        }],
        ..text_homework(
            Audience::Individual {
                student_ids: vec![s1.id],
            },
            &[],
            None,
        )
    };

    let err = env
        .homeworks
        .create_homework(&env.teacher, with_token(&foreign.token))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    // 他人的文件不会被清理
    assert!(env.files.contains(&foreign.storage_path));

    let err = env
        .homeworks
        .create_homework(&env.teacher, with_token("missing-token"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // 答案文件必须与作业类别一致
    let photo_homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            CreateHomeworkRequest {
                category: HomeworkCategory::Photo,
                ..text_homework(
                    Audience::Individual {
                        student_ids: vec![s1.id],
                    },
                    &["Q1"],
                    None,
                )
            },
        )
        .await
        .unwrap();
    let audio = env
        .uploads
        .upload(&s1_user, HomeworkCategory::Audio, "take1.mp3", MP3)
        .await
        .unwrap();
    let err = env
        .submissions
        .submit_homework(
            &s1_user,
            photo_homework.id,
            SubmitHomeworkRequest {
                answers: vec![AnswerInput {
                    assignment_id: photo_homework.assignments[0].id.clone(),
                    text_content: None,
                    file_token: Some(audio.token.clone()),
                }],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let photo = env
        .uploads
        .upload(&s1_user, HomeworkCategory::Photo, "page.png", PNG)
        .await
        .unwrap();
    let submission = env
        .submissions
        .submit_homework(
            &s1_user,
            photo_homework.id,
            SubmitHomeworkRequest {
                answers: vec![AnswerInput {
                    assignment_id: photo_homework.assignments[0].id.clone(),
                    text_content: None,
                    file_token: Some(photo.token.clone()),
                }],
            },
        )
        .await
        .unwrap();
    let file = submission.answers[0].file_reference.as_ref().unwrap();
    assert_eq!(file.token, photo.token);
    assert!(file.url.is_some());
}

#[tokio::test]
async fn test_audience_must_belong_to_teacher() {
    let env = setup().await;
    let other_teacher = create_teacher(&env.storage, "other").await;
    let (foreign_student, _) = create_student(&env, &other_teacher, "s9", None).await;
    let foreign_group = env
        .storage
        .create_group(other_teacher.id, "theirs", GroupSchedule::default())
        .await
        .unwrap();

    for audience in [
        Audience::Individual {
            student_ids: vec![foreign_student.id],
        },
        Audience::Individual {
            student_ids: vec![],
        },
        Audience::Group {
            group_id: foreign_group.id,
        },
    ] {
        let err = env
            .homeworks
            .create_homework(&env.teacher, text_homework(audience, &["Q1"], None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let (s1, _) = create_student(&env, &env.teacher, "s1", None).await;
    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id, s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();
    assert_eq!(homework.audience.student_ids(), &[s1.id]);

    let err = env
        .homeworks
        .update_homework(
            &other_teacher,
            homework.id,
            UpdateHomeworkRequest {
                description: Some("mine now".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_delete_student_removes_records_and_cached_identity() {
    let env = setup().await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", None).await;
    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();
    env.submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap();
    let upload = env
        .uploads
        .upload(&s1_user, HomeworkCategory::Photo, "page.png", PNG)
        .await
        .unwrap();

    let pending = env
        .storage
        .get_homework_by_id(homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.status, HomeworkStatus::Pending);

    let key = user_cache_key(s1_user.id);
    insert_json(env.cache.as_ref(), key.clone(), &s1_user, 0).await;

    env.directory
        .delete_student(&env.teacher, s1.id)
        .await
        .unwrap();

    assert!(env.storage.get_student_by_id(s1.id).await.unwrap().is_none());
    assert!(env.storage.get_user_by_id(s1_user.id).await.unwrap().is_none());
    assert!(
        env.storage
            .list_submissions_by_homework(homework.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(!env.files.contains(&upload.storage_path));
    assert_eq!(env.cache.get_raw(&key).await, CacheResult::NotFound);

    // 作业保留，对象为空
    let remaining = env
        .storage
        .get_homework_by_id(homework.id)
        .await
        .unwrap()
        .unwrap();
    assert!(remaining.audience.student_ids().is_empty());
    assert_eq!(remaining.status, HomeworkStatus::New);
    assert_eq!(remaining.review_outcome, None);

    // 改派给其他学生后可以重新提交
    let (s2, s2_user) = create_student(&env, &env.teacher, "s2", None).await;
    env.homeworks
        .update_homework(
            &env.teacher,
            homework.id,
            UpdateHomeworkRequest {
                audience: Some(Audience::Individual {
                    student_ids: vec![s2.id],
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let detail = env
        .homeworks
        .get_homework(&s2_user, homework.id)
        .await
        .unwrap();
    assert_eq!(detail.can_submit, Some(true));
    env.submissions
        .submit_homework(&s2_user, homework.id, answer_all(&homework))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_directory_ownership_and_validation() {
    let env = setup().await;
    let other_teacher = create_teacher(&env.storage, "other").await;
    let (s1, _) = create_student(&env, &env.teacher, "s1", None).await;

    let err = env
        .directory
        .create_student(
            &env.teacher,
            CreateStudentRequest {
                full_name: "Anna".to_string(),
                phone: None,
                group_id: None,
                username: "a b".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let group = env
        .directory
        .create_group(
            &env.teacher,
            CreateGroupRequest {
                name: " Morning ".to_string(),
                start_time: Some("09:00".to_string()),
                end_time: Some("10:30".to_string()),
                days_of_week: vec![Weekday::Wednesday, Weekday::Monday],
            },
        )
        .await
        .unwrap();
    assert_eq!(group.name, "Morning");
    assert_eq!(group.schedule.start_time.as_deref(), Some("09:00"));
    assert_eq!(
        group.schedule.days_of_week,
        vec![Weekday::Monday, Weekday::Wednesday]
    );

    let moved = env
        .directory
        .set_student_group(
            &env.teacher,
            s1.id,
            homework_tracker::models::directory::requests::SetStudentGroupRequest {
                group_id: Some(group.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.group_id, Some(group.id));
    assert_eq!(
        env.directory
            .list_students(&env.teacher, Some(group.id))
            .await
            .unwrap()
            .len(),
        1
    );

    let err = env
        .directory
        .delete_student(&other_teacher, s1.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = env
        .directory
        .delete_student(&env.teacher, 9999)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_group_detail_update_and_delete() {
    let env = setup().await;
    let other_teacher = create_teacher(&env.storage, "other").await;
    let group = create_group(&env, "Morning").await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", Some(group.id)).await;
    let (_, s2_user) = create_student(&env, &env.teacher, "s2", None).await;

    // 组员与所属教师可以查看
    let detail = env.directory.get_group(&env.teacher, group.id).await.unwrap();
    assert_eq!(detail.students.len(), 1);
    assert_eq!(detail.students[0].id, s1.id);
    assert!(env.directory.get_group(&s1_user, group.id).await.is_ok());
    for outsider in [&s2_user, &other_teacher] {
        let err = env
            .directory
            .get_group(outsider, group.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    let updated = env
        .directory
        .update_group(
            &env.teacher,
            group.id,
            UpdateGroupRequest {
                name: Some("Evening".to_string()),
                start_time: Some("18:00".to_string()),
                end_time: Some("19:30".to_string()),
                days_of_week: Some(vec![Weekday::Friday]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Evening");
    assert_eq!(updated.schedule.end_time.as_deref(), Some("19:30"));
    assert_eq!(updated.schedule.days_of_week, vec![Weekday::Friday]);

    // 未提供的字段保持不变，空字符串清除时间
    let cleared = env
        .directory
        .update_group(
            &env.teacher,
            group.id,
            UpdateGroupRequest {
                start_time: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.name, "Evening");
    assert_eq!(cleared.schedule.start_time, None);
    assert_eq!(cleared.schedule.end_time.as_deref(), Some("19:30"));

    let err = env
        .directory
        .update_group(
            &env.teacher,
            group.id,
            UpdateGroupRequest {
                start_time: Some("20:00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = env
        .directory
        .update_group(&other_teacher, group.id, UpdateGroupRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = env
        .directory
        .delete_group(&s1_user, group.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // 小组作业随小组删除，单独布置的作业保留
    let image = env
        .uploads
        .upload(&env.teacher, HomeworkCategory::Photo, "board.png", PNG)
        .await
        .unwrap();
    let group_homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            homework_with_images(
                Audience::Group { group_id: group.id },
                &[image.token.as_str()],
            ),
        )
        .await
        .unwrap();
    env.submissions
        .submit_homework(
            &s1_user,
            group_homework.id,
            SubmitHomeworkRequest {
                answers: vec![AnswerInput {
                    assignment_id: group_homework.assignments[0].id.clone(),
                    text_content: Some("done".to_string()),
                    file_token: None,
                }],
            },
        )
        .await
        .unwrap();
    let individual = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();

    env.directory
        .delete_group(&env.teacher, group.id)
        .await
        .unwrap();

    let err = env
        .directory
        .get_group(&env.teacher, group.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let member = env.storage.get_student_by_id(s1.id).await.unwrap().unwrap();
    assert_eq!(member.group_id, None);
    assert!(
        env.storage
            .get_homework_by_id(group_homework.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        env.storage
            .list_submissions_by_homework(group_homework.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(!env.files.contains(&image.storage_path));
    assert!(
        env.storage
            .get_homework_by_id(individual.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_student_detail_update_and_history() {
    let env = setup().await;
    let other_teacher = create_teacher(&env.storage, "other").await;
    let group = create_group(&env, "Morning").await;
    let (s1, s1_user) = create_student(&env, &env.teacher, "s1", Some(group.id)).await;
    let (s2, s2_user) = create_student(&env, &env.teacher, "s2", None).await;

    let homework = env
        .homeworks
        .create_homework(
            &env.teacher,
            text_homework(
                Audience::Individual {
                    student_ids: vec![s1.id],
                },
                &["Q1"],
                None,
            ),
        )
        .await
        .unwrap();
    env.submissions
        .submit_homework(&s1_user, homework.id, answer_all(&homework))
        .await
        .unwrap();

    let detail = env
        .directory
        .get_student(&env.teacher, s1.id)
        .await
        .unwrap();
    assert_eq!(detail.group.map(|g| g.id), Some(group.id));
    assert_eq!(detail.homeworks.len(), 1);
    assert!(detail.homeworks[0].submission.is_some());
    assert_eq!(detail.homeworks[0].can_submit, Some(false));

    // 学生只能查看自己
    let own = env.directory.get_student(&s1_user, s1.id).await.unwrap();
    assert_eq!(own.student.id, s1.id);
    let err = env
        .directory
        .get_student(&s2_user, s1.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = env
        .directory
        .get_student(&other_teacher, s1.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let history = env
        .directory
        .list_student_homeworks(&env.teacher, s1.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].homework.id, homework.id);
    assert!(
        env.directory
            .list_student_homeworks(&env.teacher, s2.id)
            .await
            .unwrap()
            .is_empty()
    );
    for caller in [&s1_user, &other_teacher] {
        let err = env
            .directory
            .list_student_homeworks(caller, s1.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    let key = user_cache_key(s1_user.id);
    insert_json(env.cache.as_ref(), key.clone(), &s1_user, 0).await;

    let updated = env
        .directory
        .update_student(
            &env.teacher,
            s1.id,
            UpdateStudentRequest {
                full_name: Some(" Anna K ".to_string()),
                phone: Some(" 555-0101 ".to_string()),
                username: Some("anna.k".to_string()),
                password: Some("newsecret".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Anna K");
    assert_eq!(updated.phone.as_deref(), Some("555-0101"));
    assert_eq!(updated.group_id, Some(group.id));
    assert_eq!(env.cache.get_raw(&key).await, CacheResult::NotFound);

    let account = env
        .storage
        .get_user_by_username("anna.k")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.id, s1_user.id);
    assert_eq!(account.full_name, "Anna K");
    assert!(verify_password("newsecret", &account.password_hash));
    assert!(env.storage.get_user_by_username("s1").await.unwrap().is_none());

    // 用户名冲突与空白姓名
    let err = env
        .directory
        .update_student(
            &env.teacher,
            s1.id,
            UpdateStudentRequest {
                username: Some("s2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = env
        .directory
        .update_student(
            &env.teacher,
            s1.id,
            UpdateStudentRequest {
                full_name: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // 空字符串清除电话，其他字段不变
    let cleared = env
        .directory
        .update_student(
            &env.teacher,
            s1.id,
            UpdateStudentRequest {
                phone: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.phone, None);
    assert_eq!(cleared.full_name, "Anna K");

    let err = env
        .directory
        .update_student(&other_teacher, s1.id, UpdateStudentRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_provision_teacher_is_idempotent() {
    let storage = memory_storage().await;

    let outcome = provision_teacher(
        storage.as_ref(),
        Some("headteacher".to_string()),
        None,
    )
    .await
    .unwrap();
    match outcome {
        ProvisionOutcome::Created {
            username,
            generated_password,
        } => {
            assert_eq!(username, "headteacher");
            assert_eq!(generated_password.map(|p| p.len()), Some(16));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let again = provision_teacher(storage.as_ref(), None, None).await.unwrap();
    assert_eq!(again, ProvisionOutcome::AlreadyProvisioned);
    assert_eq!(storage.count_teachers().await.unwrap(), 1);
}

//! 作业与提交的关联规则
//!
//! 纯逻辑，不做任何 I/O：小题集校验与标识保留、访问与提交资格判断、
//! 答案匹配，以及批改结果对作业状态的回写。

pub mod access;
pub mod answers;
pub mod assignment_set;
pub mod review;

pub use access::{can_submit, deadline_passed, has_access};
pub use answers::{MatchedAnswer, match_answers};
pub use assignment_set::{AssignmentSpec, validate_assignments};
pub use review::{parse_decision, status_after_review, status_after_submit};

use std::collections::HashSet;

use crate::errors::{HWSystemError, Result};
use crate::models::files::entities::Attachment;
use crate::models::homeworks::entities::{Assignment, Homework};
use crate::models::submissions::{entities::Answer, requests::AnswerInput};

/// 与小题匹配成功的答案，文件尚未解析
#[derive(Debug, Clone)]
pub struct MatchedAnswer<'a> {
    pub assignment: &'a Assignment,
    pub text_content: Option<String>,
    pub file_token: Option<String>,
}

impl MatchedAnswer<'_> {
    /// 生成答案记录，小题名称按提交时快照
    pub fn into_answer(self, file: Option<Attachment>) -> Answer {
        Answer {
            assignment_id: self.assignment.id.clone(),
            assignment_name: self.assignment.name.clone(),
            text_content: self.text_content,
            file_reference: file,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| !v.trim().is_empty())
        .cloned()
}

/// 将原始答案与作业当前的小题集匹配
///
/// 找不到对应小题的答案直接丢弃；同一小题出现两次、没有任何有效答案，
/// 或内容形式不符合作业类别时返回校验错误。
pub fn match_answers<'a>(
    homework: &'a Homework,
    raw: &[AnswerInput],
) -> Result<Vec<MatchedAnswer<'a>>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut matched = Vec::new();

    for (index, input) in raw.iter().enumerate() {
        let Some(assignment) = homework.find_assignment(&input.assignment_id) else {
            tracing::debug!(
                "丢弃未匹配的答案: homework={}, assignment_id={}",
                homework.id,
                input.assignment_id
            );
            continue;
        };

        let field = format!("answers[{index}]");
        if !seen.insert(assignment.id.as_str()) {
            return Err(HWSystemError::invalid_field(
                &field,
                format!("assignment '{}' is answered more than once", assignment.name),
            ));
        }

        let text_content = non_blank(&input.text_content);
        let file_token = non_blank(&input.file_token);

        if homework.category.requires_text_answer() {
            if text_content.is_none() {
                return Err(HWSystemError::invalid_field(
                    &format!("{field}.text_content"),
                    "text answer is required",
                ));
            }
            if file_token.is_some() {
                return Err(HWSystemError::invalid_field(
                    &format!("{field}.file_token"),
                    "text homework does not accept files",
                ));
            }
        } else if text_content.is_some() == file_token.is_some() {
            return Err(HWSystemError::invalid_field(
                &field,
                "exactly one of text_content or file_token is required",
            ));
        }

        matched.push(MatchedAnswer {
            assignment,
            text_content,
            file_token,
        });
    }

    if matched.is_empty() {
        return Err(HWSystemError::invalid_field(
            "answers",
            "at least one answer must match an assignment of this homework",
        ));
    }

    Ok(matched)
}

use std::collections::HashSet;

use uuid::Uuid;

use crate::errors::{HWSystemError, Result};
use crate::models::files::entities::Attachment;
use crate::models::homeworks::entities::Assignment;

/// 待校验的小题，附件已解析
#[derive(Debug, Clone)]
pub struct AssignmentSpec {
    pub id: Option<String>,
    pub name: String,
    pub images: Vec<Attachment>,
}

/// 校验小题集并分配标识
///
/// `existing` 为更新前的小题集（创建时为空）。标识按以下顺序确定：
/// 显式给出的 id（必须存在于 `existing`），名称相同且尚未被认领的已有小题，最后才生成新 id。
pub fn validate_assignments(
    specs: Vec<AssignmentSpec>,
    existing: &[Assignment],
) -> Result<Vec<Assignment>> {
    if specs.is_empty() {
        return Err(HWSystemError::invalid_field(
            "assignments",
            "at least one assignment is required",
        ));
    }

    let mut claimed: HashSet<&str> = HashSet::new();

    // 先认领显式 id，避免被同名匹配抢占
    for (index, spec) in specs.iter().enumerate() {
        if spec.name.trim().is_empty() {
            return Err(HWSystemError::invalid_field(
                &format!("assignments[{index}].name"),
                "must not be blank",
            ));
        }
        if let Some(id) = spec.id.as_deref() {
            let known = existing.iter().find(|a| a.id == id).ok_or_else(|| {
                HWSystemError::invalid_field(
                    &format!("assignments[{index}].id"),
                    format!("unknown assignment id '{id}'"),
                )
            })?;
            if !claimed.insert(known.id.as_str()) {
                return Err(HWSystemError::invalid_field(
                    &format!("assignments[{index}].id"),
                    format!("assignment id '{id}' is used more than once"),
                ));
            }
        }
    }

    let mut result = Vec::with_capacity(specs.len());
    for spec in specs {
        let name = spec.name.trim().to_string();
        let id = match spec.id {
            Some(id) => id,
            None => match existing
                .iter()
                .find(|a| a.name == name && !claimed.contains(a.id.as_str()))
            {
                Some(matched) => {
                    claimed.insert(matched.id.as_str());
                    matched.id.clone()
                }
                None => Uuid::new_v4().to_string(),
            },
        };

        result.push(Assignment {
            id,
            name,
            images: spec.images,
        });
    }

    Ok(result)
}

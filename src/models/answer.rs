use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::question::QuestionType;

/// 求解服务返回的一条答案，按宽松方式解码
///
/// 服务端对单题失败会返回 `{question_id, error}`，正常答案则按题型携带
/// `option_indices` 或 `text_answer`。这里所有字段都是可选的：缺字段的
/// 条目不在解码阶段拒绝，而是留给注入阶段逐条兜底处理。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerRecord {
    pub question_id: Option<u32>,
    pub question_type: Option<QuestionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_indices: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
    /// 单题 token 用量，只透传到日志
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<JsonValue>,
    /// 服务端单题失败时的错误说明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerRecord {
    /// 按题型把松散字段收拢成带判别的载荷
    ///
    /// 失败即该条答案的跳过原因，绝不让单条坏答案拖垮整批。
    pub fn payload(&self) -> Result<AnswerPayload, SkipReason> {
        if let Some(message) = &self.error {
            return Err(SkipReason::ServiceError(message.clone()));
        }
        let question_type = self.question_type.ok_or(SkipReason::MissingType)?;
        match question_type {
            QuestionType::Mcq | QuestionType::Msq => {
                let indices = self
                    .option_indices
                    .clone()
                    .ok_or(SkipReason::MissingIndices)?;
                if question_type == QuestionType::Mcq {
                    Ok(AnswerPayload::Mcq { indices })
                } else {
                    Ok(AnswerPayload::Msq { indices })
                }
            }
            QuestionType::Numerical => {
                let text = self.text_answer.clone().ok_or(SkipReason::MissingText)?;
                Ok(AnswerPayload::Numerical { text })
            }
        }
    }
}

/// 答案载荷，按题型判别
///
/// 注入阶段对它做穷尽匹配，字段有无的检查全部留在 `AnswerRecord::payload`。
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerPayload {
    Mcq { indices: Vec<usize> },
    Msq { indices: Vec<usize> },
    Numerical { text: String },
}

impl AnswerPayload {
    /// 选择题的目标选项下标（填空题返回 None）
    pub fn indices(&self) -> Option<&[usize]> {
        match self {
            AnswerPayload::Mcq { indices } | AnswerPayload::Msq { indices } => Some(indices),
            AnswerPayload::Numerical { .. } => None,
        }
    }
}

/// 单条答案被跳过的原因（逐条处理，只记日志）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 服务端对该题报告了错误
    ServiceError(String),
    /// 缺少 question_id，无法定位容器
    MissingQuestionId,
    /// question_id 超出页面容器范围
    ContainerMissing,
    /// 容器内找不到作答控件
    InputMissing,
    /// 缺少题型字段
    MissingType,
    /// 选择题缺少 option_indices
    MissingIndices,
    /// 填空题缺少 text_answer
    MissingText,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ServiceError(msg) => write!(f, "服务端单题失败: {}", msg),
            SkipReason::MissingQuestionId => write!(f, "缺少 question_id"),
            SkipReason::ContainerMissing => write!(f, "页面上找不到对应容器"),
            SkipReason::InputMissing => write!(f, "容器内找不到作答控件"),
            SkipReason::MissingType => write!(f, "缺少题型字段"),
            SkipReason::MissingIndices => write!(f, "缺少 option_indices"),
            SkipReason::MissingText => write!(f, "缺少 text_answer"),
        }
    }
}

/// 求解服务的完整应答：逐题结果加整批 token 汇总
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveResponse {
    pub results: Vec<AnswerRecord>,
    /// 整批用量汇总，只透传到日志
    #[serde(default)]
    pub token_summary: JsonValue,
}

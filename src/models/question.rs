use serde::{Deserialize, Serialize};

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// 单选题
    Mcq,
    /// 多选题
    Msq,
    /// 填空题（数值/文本作答）
    Numerical,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "单选"),
            QuestionType::Msq => write!(f, "多选"),
            QuestionType::Numerical => write!(f, "填空"),
        }
    }
}

/// 一道已归一化的题目，字段名与求解服务的线上格式一一对应
///
/// `question_id` 是本次提取中该容器在页面上的 1 起始位置（包含被跳过的
/// 容器占位），注入阶段靠它重新定位容器，所以它必须等于容器序号而不是
/// 发射计数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: u32,
    pub question_type: QuestionType,
    /// 题干文本（空白已折叠）；配图题可以为空串
    pub question_text: String,
    /// 题组导语（无题组时为空串）
    pub case_study_text: String,
    /// 配图的绝对 URL
    pub image_url: Option<String>,
    /// 选项文本，按 DOM 顺序；填空题为空
    pub options: Vec<String>,
}

impl QuestionRecord {
    /// 日志用的题干预览
    pub fn preview(&self) -> String {
        crate::utils::logging::truncate_text(&self.question_text, 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&QuestionType::Mcq).unwrap(),
            r#""mcq""#
        );
        assert_eq!(
            serde_json::to_string(&QuestionType::Msq).unwrap(),
            r#""msq""#
        );
        assert_eq!(
            serde_json::to_string(&QuestionType::Numerical).unwrap(),
            r#""numerical""#
        );
    }

    #[test]
    fn test_record_wire_shape() {
        let record = QuestionRecord {
            question_id: 3,
            question_type: QuestionType::Mcq,
            question_text: "下列哪个是质数？".to_string(),
            case_study_text: String::new(),
            image_url: None,
            options: vec!["4".to_string(), "7".to_string(), "9".to_string()],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["question_id"], 3);
        assert_eq!(value["question_type"], "mcq");
        assert_eq!(value["case_study_text"], "");
        assert!(value["image_url"].is_null());
        assert_eq!(value["options"].as_array().unwrap().len(), 3);
    }
}

//! 求解服务应答的解码
//!
//! 请求方向直接用 serde 把 `Vec<QuestionRecord>` 序列化成扁平 JSON 数组，
//! 无需额外代码；应答方向这里做宽松解码：顶层结构缺失是硬错误，单条
//! 答案损坏则降级为空记录，留给注入阶段逐条跳过。

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::SolverError;
use crate::models::answer::{AnswerRecord, SolveResponse};

/// 解码求解服务的应答体
///
/// `results` 缺失或不是数组时返回 `MalformedResponse`；数组里的单条
/// 坏条目保留位置、字段置空。`token_summary` 原样透传。
pub fn decode_response(body: JsonValue) -> Result<SolveResponse, SolverError> {
    let results = body
        .get("results")
        .ok_or_else(|| SolverError::MalformedResponse {
            reason: "缺少 results 字段".to_string(),
        })?
        .as_array()
        .ok_or_else(|| SolverError::MalformedResponse {
            reason: "results 不是数组".to_string(),
        })?;

    let records = results
        .iter()
        .map(|entry| match serde_json::from_value::<AnswerRecord>(entry.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!("答案条目无法解析，字段置空留待逐条跳过: {} ({})", entry, e);
                AnswerRecord::default()
            }
        })
        .collect();

    let token_summary = body
        .get("token_summary")
        .cloned()
        .unwrap_or(JsonValue::Null);

    Ok(SolveResponse {
        results: records,
        token_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;
    use serde_json::json;

    #[test]
    fn test_decode_well_formed_response() {
        let body = json!({
            "results": [
                {
                    "question_id": 1,
                    "question_type": "mcq",
                    "option_indices": [2],
                    "tokens_used": {"input_tokens": 10, "output_tokens": 2, "total_tokens": 12}
                },
                {
                    "question_id": 2,
                    "question_type": "numerical",
                    "text_answer": "42"
                }
            ],
            "token_summary": {"total_questions": 2, "total_tokens": 12}
        });

        let response = decode_response(body).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].question_id, Some(1));
        assert_eq!(response.results[0].question_type, Some(QuestionType::Mcq));
        assert_eq!(response.results[0].option_indices, Some(vec![2]));
        assert_eq!(response.results[1].text_answer.as_deref(), Some("42"));
        assert_eq!(response.token_summary["total_questions"], 2);
    }

    #[test]
    fn test_decode_missing_results_is_malformed() {
        let err = decode_response(json!({"token_summary": {}})).unwrap_err();
        assert!(matches!(err, SolverError::MalformedResponse { .. }));
    }

    #[test]
    fn test_decode_results_not_an_array_is_malformed() {
        let err = decode_response(json!({"results": "oops"})).unwrap_err();
        assert!(matches!(err, SolverError::MalformedResponse { .. }));
    }

    #[test]
    fn test_decode_preserves_broken_entries_in_place() {
        let body = json!({
            "results": [
                {"question_id": "not-a-number"},
                {"question_id": 2, "question_type": "numerical", "text_answer": "1.5"}
            ]
        });
        let response = decode_response(body).unwrap();
        // 坏条目保留占位，字段置空
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].question_id, None);
        assert_eq!(response.results[1].question_id, Some(2));
        assert_eq!(response.token_summary, JsonValue::Null);
    }

    #[test]
    fn test_decode_error_entry_passes_through() {
        let body = json!({
            "results": [
                {"question_id": 1, "error": "VLM processing failed"}
            ],
            "token_summary": {"total_questions": 1}
        });
        let response = decode_response(body).unwrap();
        assert_eq!(
            response.results[0].error.as_deref(),
            Some("VLM processing failed")
        );
    }
}

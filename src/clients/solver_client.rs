//! 求解客户端
//!
//! 封装对外部答案解析服务的唯一一次 POST 调用。服务本身（模型选择、
//! 打分逻辑）在系统边界之外，这里只关心线上格式和状态码。
//!
//! 刻意不做重试、不做退避：需要弹性的调用方自行在外层包装。超时由
//! 配置给定，挂在 reqwest 客户端上。

use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, SolverError};
use crate::models::codec::decode_response;
use crate::models::answer::SolveResponse;
use crate::models::question::QuestionRecord;

/// 求解服务客户端
pub struct SolverClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SolverClient {
    /// 创建新的求解客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.solver_timeout_secs))
            .build()
            .map_err(|e| AppError::solver_request_failed(&config.solver_api_url, e))?;

        Ok(Self {
            http,
            endpoint: config.solver_api_url.clone(),
        })
    }

    /// 把一批题目 POST 给求解服务并解码应答
    ///
    /// 非 2xx 状态码是 `UpstreamHttp`；应答体缺少必要结构是
    /// `MalformedResponse`（单条坏答案不在这里拒绝，见 codec）。
    pub async fn solve(&self, batch: &[QuestionRecord]) -> Result<SolveResponse, SolverError> {
        debug!("POST {} ({} 题)", self.endpoint, batch.len());

        let response = self
            .http
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await
            .map_err(|e| SolverError::RequestFailed {
                endpoint: self.endpoint.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolverError::UpstreamHttp {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: JsonValue =
            response
                .json()
                .await
                .map_err(|e| SolverError::RequestFailed {
                    endpoint: self.endpoint.clone(),
                    source: Box::new(e),
                })?;

        decode_response(body)
    }
}

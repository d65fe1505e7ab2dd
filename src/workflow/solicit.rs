//! 求解征询策略 - 流程层
//!
//! 提取/注入逻辑只有一份，两种部署形态的差别全部收敛到"批次怎么送
//! 出去"这一个接口上：
//!
//! - `DirectCall`：单上下文部署，调用方自己就有网络权限，直接驱动
//!   求解客户端；
//! - `RelayedCall`：双上下文部署，批次装进 `SOLVE_EXAM` 信封经中继
//!   送往特权上下文，应答信封在这里拆开。
//!
//! 构造时二选一，流水线对差别无感。

use async_trait::async_trait;

use crate::clients::SolverClient;
use crate::error::{AppResult, SolverError};
use crate::infrastructure::relay::{RelayHandle, RelayMessage};
use crate::models::answer::SolveResponse;
use crate::models::question::QuestionRecord;

/// 把一批题目送去求解的策略接口
#[async_trait]
pub trait SolveStrategy: Send + Sync {
    /// 送出批次并取回解码后的应答
    async fn solicit(&self, batch: &[QuestionRecord]) -> AppResult<SolveResponse>;

    /// 日志用的策略名
    fn name(&self) -> &'static str;
}

/// 单上下文部署：直接调用求解客户端
pub struct DirectCall {
    client: SolverClient,
}

impl DirectCall {
    pub fn new(client: SolverClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SolveStrategy for DirectCall {
    async fn solicit(&self, batch: &[QuestionRecord]) -> AppResult<SolveResponse> {
        Ok(self.client.solve(batch).await?)
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// 双上下文部署：经中继通道征询特权上下文
pub struct RelayedCall {
    handle: RelayHandle,
}

impl RelayedCall {
    pub fn new(handle: RelayHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl SolveStrategy for RelayedCall {
    async fn solicit(&self, batch: &[QuestionRecord]) -> AppResult<SolveResponse> {
        // 传输层失败（RelayError）直接经 From 上抛，与业务失败分开
        let response = self
            .handle
            .send(RelayMessage::SolveExam {
                payload: batch.to_vec(),
            })
            .await?;

        if response.success {
            response.data.ok_or_else(|| {
                SolverError::MalformedResponse {
                    reason: "success 应答缺少 data".to_string(),
                }
                .into()
            })
        } else {
            Err(SolverError::Remote {
                message: response
                    .error
                    .unwrap_or_else(|| "对端未说明原因".to_string()),
            }
            .into())
        }
    }

    fn name(&self) -> &'static str {
        "relayed"
    }
}

//! 上下文中继 - 基础设施层
//!
//! 受限前台上下文（页面）不允许直接发起求解请求，出站调用必须由特权
//! 后台上下文（本进程的中继工作任务）代为执行。这里实现两端之间的
//! 一次性请求/应答通道：
//!
//! - 发送端把带标签的 `SOLVE_EXAM` 消息投进 mpsc 队列，随后挂起等待
//!   与之关联的应答；
//! - 工作任务收到消息后调用求解客户端，**无论成败都恰好应答一次**；
//! - 应答槽是每个请求独占的 `oneshot::Sender` —— "保持通道开启直到
//!   异步应答到达"这条约定由类型系统保证，而不是靠人遵守。
//!
//! 通道层面的投递失败（队列关闭、应答槽被释放）是 `RelayError`，与
//! 应答里 `success: false` 的业务失败严格区分。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::clients::SolverClient;
use crate::models::answer::SolveResponse;
use crate::models::question::QuestionRecord;

/// 从受限上下文发往特权上下文的带标签消息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RelayMessage {
    /// 求解一批题目
    #[serde(rename = "SOLVE_EXAM")]
    SolveExam { payload: Vec<QuestionRecord> },
}

/// 特权上下文的应答信封
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SolveResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResponse {
    pub fn ok(data: SolveResponse) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// 中继传输层错误（区别于应答里的业务失败）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    /// 消息根本没能投递出去
    #[error("消息无法投递: 中继通道已关闭")]
    ChannelClosed,
    /// 消息送达了，但应答槽在回复之前被释放
    #[error("应答丢失: 应答槽在回复前被释放")]
    ReplyDropped,
}

/// 在途的一个请求：消息本体加上它独占的应答槽
#[derive(Debug)]
pub struct RelayEnvelope {
    pub message: RelayMessage,
    pub reply: oneshot::Sender<RelayResponse>,
}

/// 中继的发送端，归受限上下文一侧持有
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayEnvelope>,
}

impl RelayHandle {
    /// 建立一条裸通道（接收端由调用方处置；正常部署用 `spawn_relay_worker`）
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RelayEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// 投递一条消息并挂起等待关联应答
    pub async fn send(&self, message: RelayMessage) -> Result<RelayResponse, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RelayEnvelope {
                message,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RelayError::ChannelClosed)?;
        reply_rx.await.map_err(|_| RelayError::ReplyDropped)
    }
}

/// 启动特权上下文一侧的中继工作任务
///
/// 工作任务独占求解客户端；每收到一条 `SOLVE_EXAM` 就发起一次出站
/// 调用，并把结果装进应答信封发回。发送端若已放弃等待，应答被静默
/// 丢弃，不影响后续请求。
pub fn spawn_relay_worker(client: SolverClient) -> RelayHandle {
    let (handle, mut rx) = RelayHandle::channel(8);

    tokio::spawn(async move {
        while let Some(RelayEnvelope { message, reply }) = rx.recv().await {
            let response = match message {
                RelayMessage::SolveExam { payload } => {
                    info!("📨 中继收到 SOLVE_EXAM，共 {} 题", payload.len());
                    match client.solve(&payload).await {
                        Ok(data) => RelayResponse::ok(data),
                        Err(e) => {
                            warn!("中继侧求解失败: {}", e);
                            RelayResponse::fail(e.to_string())
                        }
                    }
                }
            };
            if reply.send(response).is_err() {
                warn!("发送端已放弃等待，应答被丢弃");
            }
        }
        debug!("中继工作任务退出");
    });

    handle
}

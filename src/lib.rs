//! # Solve Exam Submit
//!
//! 一个自动作答网页考试并交卷的 Rust 应用程序：从页面提取题目、
//! 送外部求解服务解答、把答案写回页面、触发交卷。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力（受限前台上下文的入口）
//! - `relay` - 受限/特权上下文之间的一次性请求应答通道
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 描述"我能对页面做什么"
//! - `QuestionExtractor` - 扫描题目容器，产出归一化批次
//! - `AnswerInjector` - 按 question_id 把答案逐条写回页面
//! - `SubmitTrigger` - 静置后模拟点击交卷按钮
//! - `clients/SolverClient` - 对外部求解服务的唯一一次 POST
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一轮作答"的完整流程
//! - `SolveStrategy` - 征询策略接口（直连 / 中继二选一）
//! - `ExamPipeline` - 显式状态机：提取 → 征询 → 注入 → 交卷
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用生命周期、浏览器资源、事件循环
//! - `orchestrator/trigger` - 快捷键激活通道（注册一次，关停注销）

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_headless_browser};
pub use config::{Config, Selectors};
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, RelayHandle, RelayMessage, RelayResponse};
pub use models::{AnswerPayload, AnswerRecord, QuestionRecord, QuestionType, SolveResponse};
pub use orchestrator::App;
pub use workflow::{ExamPipeline, PipelineState, RunOutcome, SolveStrategy};

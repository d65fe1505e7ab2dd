//! 作答流水线 - 流程层
//!
//! 把一轮完整作答编排成显式状态机：
//!
//! ```text
//! Idle → Extracting → Soliciting → Injecting → Submitting → Done
//!            │             │                        │
//!            │ 空批次      │ 传输/业务失败          │ 交卷按钮缺失
//!            ▼             ▼                        ▼
//!         Aborted        Failed                   Failed
//! ```
//!
//! 所有终态都立刻回到 `Idle` 等待下一次触发。状态不在 `Idle` 时的
//! 触发被拒绝（只记日志），这是对"一次征询在途时再次触发"的显式
//! 选择：拒绝而不是排队。
//!
//! 任何失败路径都降级为日志加终态，绝不向宿主进程抛未处理的错误。

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ExtractError;
use crate::infrastructure::JsExecutor;
use crate::services::{AnswerInjector, QuestionExtractor, SubmitTrigger};
use crate::workflow::solicit::SolveStrategy;

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    Idle = 0,
    Extracting = 1,
    Soliciting = 2,
    Injecting = 3,
    Submitting = 4,
    Done = 5,
    Aborted = 6,
    Failed = 7,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PipelineState::Extracting,
            2 => PipelineState::Soliciting,
            3 => PipelineState::Injecting,
            4 => PipelineState::Submitting,
            5 => PipelineState::Done,
            6 => PipelineState::Aborted,
            7 => PipelineState::Failed,
            _ => PipelineState::Idle,
        }
    }
}

/// 一轮流程的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 完整跑完并交卷
    Done,
    /// 空批次中止（没发出任何网络调用）
    Aborted,
    /// 征询或交卷阶段失败
    Failed,
    /// 触发被再入闸门拒绝
    Rejected,
}

/// 再入闸门：持有当前状态，只放行 Idle 时的触发
pub struct StateGate {
    state: AtomicU8,
}

impl StateGate {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(PipelineState::Idle as u8),
        }
    }

    pub fn current(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Idle → Extracting，原子成功才算放行
    pub fn try_begin(&self) -> bool {
        self.state
            .compare_exchange(
                PipelineState::Idle as u8,
                PipelineState::Extracting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn transition(&self, next: PipelineState) {
        self.state.store(next as u8, Ordering::Release);
        debug!("流水线状态 → {:?}", next);
    }
}

impl Default for StateGate {
    fn default() -> Self {
        Self::new()
    }
}

/// 作答流水线
///
/// 持有提取、注入、交卷三个页面能力和一个求解征询策略；每次触发跑
/// 一轮，批次在各阶段之间按值移交，跑完即丢，不跨轮保留。
pub struct ExamPipeline {
    executor: Arc<JsExecutor>,
    extractor: QuestionExtractor,
    injector: AnswerInjector,
    submitter: SubmitTrigger,
    strategy: Box<dyn SolveStrategy>,
    gate: StateGate,
    verbose_logging: bool,
}

impl ExamPipeline {
    /// 创建新的流水线
    pub fn new(
        config: &Config,
        executor: Arc<JsExecutor>,
        strategy: Box<dyn SolveStrategy>,
    ) -> Self {
        Self {
            executor,
            extractor: QuestionExtractor::new(&config.selectors),
            injector: AnswerInjector::new(&config.selectors),
            submitter: SubmitTrigger::new(config),
            strategy,
            gate: StateGate::new(),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 当前是否空闲（触发方的快速预判；权威判定在 run 内部）
    pub fn is_idle(&self) -> bool {
        self.gate.current() == PipelineState::Idle
    }

    /// 跑一轮完整流程
    pub async fn run(&self) -> RunOutcome {
        if !self.gate.try_begin() {
            warn!(
                "⏳ 上一轮流程仍在 {:?} 阶段，本次触发被拒绝",
                self.gate.current()
            );
            return RunOutcome::Rejected;
        }

        let started = chrono::Local::now();
        info!("🚀 开始一轮作答流程");

        // ① 提取
        let batch = match self.extractor.extract(&self.executor).await {
            Ok(batch) if batch.is_empty() => {
                warn!("⚠️ {}，本轮中止", ExtractError::NoQuestionsDetected);
                return self.finish(PipelineState::Aborted);
            }
            Ok(batch) => batch,
            Err(e) => {
                error!("❌ 提取阶段失败: {}", e);
                return self.finish(PipelineState::Failed);
            }
        };
        if self.verbose_logging {
            for record in &batch {
                info!(
                    "[题目 {}] {} | {}",
                    record.question_id,
                    record.question_type,
                    record.preview()
                );
            }
        }

        // ② 征询（批次编码由 serde 在策略内部完成）
        self.gate.transition(PipelineState::Soliciting);
        info!(
            "📡 经 {} 策略征询求解服务（{} 题）...",
            self.strategy.name(),
            batch.len()
        );
        let response = match self.strategy.solicit(&batch).await {
            Ok(response) => response,
            Err(e) => {
                error!("❌ 征询失败: {}", e);
                return self.finish(PipelineState::Failed);
            }
        };
        log_token_summary(&response.token_summary);

        // ③ 注入
        self.gate.transition(PipelineState::Injecting);
        let stats = self
            .injector
            .apply_all(&self.executor, &response.results)
            .await;

        // ④ 交卷
        self.gate.transition(PipelineState::Submitting);
        match self.submitter.trigger(&self.executor).await {
            Ok(()) => {
                info!(
                    "🎉 本轮完成: 写回 {} 条，耗时 {} 秒",
                    stats.applied,
                    (chrono::Local::now() - started).num_seconds()
                );
                self.finish(PipelineState::Done)
            }
            Err(e) => {
                // 已注入的答案保留在页面上，只有交卷这一步算失败
                error!("⚠️ {}（已注入的 {} 条答案保留在页面上）", e, stats.applied);
                self.finish(PipelineState::Failed)
            }
        }
    }

    /// 落入终态并立刻回到 Idle
    fn finish(&self, terminal: PipelineState) -> RunOutcome {
        let outcome = match terminal {
            PipelineState::Done => RunOutcome::Done,
            PipelineState::Aborted => RunOutcome::Aborted,
            _ => RunOutcome::Failed,
        };
        self.gate.transition(terminal);
        self.gate.transition(PipelineState::Idle);
        outcome
    }
}

/// 整批 token 用量只透传到日志
fn log_token_summary(summary: &JsonValue) {
    if summary.is_null() {
        debug!("应答未携带 token 汇总");
    } else {
        info!("🧾 token 汇总: {}", summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_starts_idle() {
        let gate = StateGate::new();
        assert_eq!(gate.current(), PipelineState::Idle);
    }

    #[test]
    fn test_gate_rejects_reentrant_begin() {
        let gate = StateGate::new();
        assert!(gate.try_begin());
        assert_eq!(gate.current(), PipelineState::Extracting);
        // 在途时再次触发被拒绝
        assert!(!gate.try_begin());
    }

    #[test]
    fn test_gate_allows_begin_after_reset() {
        let gate = StateGate::new();
        assert!(gate.try_begin());
        gate.transition(PipelineState::Done);
        gate.transition(PipelineState::Idle);
        assert!(gate.try_begin());
    }

    #[test]
    fn test_state_round_trip() {
        for state in [
            PipelineState::Idle,
            PipelineState::Extracting,
            PipelineState::Soliciting,
            PipelineState::Injecting,
            PipelineState::Submitting,
            PipelineState::Done,
            PipelineState::Aborted,
            PipelineState::Failed,
        ] {
            assert_eq!(PipelineState::from_u8(state as u8), state);
        }
    }
}

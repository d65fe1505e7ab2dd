//! 交卷触发服务 - 业务能力层
//!
//! 注入落定后按固定 id 找到交卷按钮并模拟点击。按钮不存在只算交卷
//! 这一步失败，已注入的答案留在页面上不回滚。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError, SubmitError};
use crate::infrastructure::js_executor::js_string;
use crate::infrastructure::JsExecutor;

/// 交卷触发服务
pub struct SubmitTrigger {
    element_id: String,
    settle: Duration,
}

impl SubmitTrigger {
    /// 创建新的交卷触发服务
    pub fn new(config: &Config) -> Self {
        Self {
            element_id: config.selectors.submit_button_id.clone(),
            settle: Duration::from_millis(config.submit_settle_ms),
        }
    }

    /// 静置后模拟点击交卷按钮
    ///
    /// 静置是给注入事件的副作用（框架状态同步）留时间。
    pub async fn trigger(&self, executor: &JsExecutor) -> AppResult<()> {
        debug!("静置 {} ms 等待注入副作用落定", self.settle.as_millis());
        sleep(self.settle).await;

        let clicked: bool = executor.eval_as(self.click_script()).await.map_err(|e| {
            AppError::Browser(BrowserError::ScriptExecutionFailed { source: e.into() })
        })?;

        if clicked {
            info!("📤 已点击交卷按钮 (id: {})", self.element_id);
            Ok(())
        } else {
            Err(SubmitError::MissingSubmitControl {
                element_id: self.element_id.clone(),
            }
            .into())
        }
    }

    fn click_script(&self) -> String {
        format!(
            r#"
            (() => {{
                const btn = document.getElementById({id});
                if (!btn) return false;
                btn.click();
                return true;
            }})()
            "#,
            id = js_string(&self.element_id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_script_uses_fixed_id() {
        let trigger = SubmitTrigger::new(&Config::default());
        let script = trigger.click_script();
        assert!(script.contains(r#"getElementById("exam-submit")"#));
        assert!(script.contains("btn.click()"));
    }
}

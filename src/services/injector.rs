//! 答案注入服务 - 业务能力层
//!
//! 把求解结果逐条写回页面。定位完全靠 `question_id`：答案按
//! `question_id - 1` 回查**当下重新查询**的容器列表（不缓存提取阶段
//! 的元素引用，页面重渲染也不怕）。因此注入与结果顺序无关。
//!
//! 两条铁律：
//! - 选择题必须走模拟点击（`click()`），不能直接写 checked 属性——
//!   宿主页面的前端框架挂在用户动作事件上，属性赋值它看不见；
//!   已选中的控件不再点击，同一批答案重放一遍不会产生新动作。
//! - 单条答案的任何问题（容器缺失、控件缺失、下标越界、字段缺失）
//!   都只跳过该条并记一行日志，绝不让整批注入失败。

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::Selectors;
use crate::infrastructure::js_executor::js_string;
use crate::infrastructure::JsExecutor;
use crate::models::answer::{AnswerPayload, AnswerRecord, SkipReason};

/// 一轮注入的统计
#[derive(Debug, Default, Clone, Copy)]
pub struct InjectionStats {
    /// 成功写回的答案条数
    pub applied: usize,
    /// 被跳过的答案条数
    pub skipped: usize,
    /// 实际发生的模拟点击次数
    pub activations: usize,
}

/// 页面侧单条注入的执行结果
#[derive(Debug, Deserialize)]
struct ApplyOutcome {
    status: String,
    #[serde(default)]
    activations: usize,
    #[serde(default)]
    reason: Option<String>,
}

/// 答案注入服务
pub struct AnswerInjector {
    selectors: Selectors,
}

impl AnswerInjector {
    /// 创建新的注入服务
    pub fn new(selectors: &Selectors) -> Self {
        Self {
            selectors: selectors.clone(),
        }
    }

    /// 逐条写回一批答案；单条失败只计入统计，永不中断整批
    pub async fn apply_all(
        &self,
        executor: &JsExecutor,
        answers: &[AnswerRecord],
    ) -> InjectionStats {
        let mut stats = InjectionStats::default();

        for answer in answers {
            match self.apply_one(executor, answer).await {
                Ok(activations) => {
                    stats.applied += 1;
                    stats.activations += activations;
                }
                Err(reason) => {
                    let label = answer
                        .question_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    warn!("[题目 {}] ⚠️ 跳过: {}", label, reason);
                    stats.skipped += 1;
                }
            }
        }

        info!(
            "💉 注入完成: 写回 {} 条 / 跳过 {} 条 / 模拟点击 {} 次",
            stats.applied, stats.skipped, stats.activations
        );
        stats
    }

    /// 写回单条答案，返回模拟点击次数
    async fn apply_one(
        &self,
        executor: &JsExecutor,
        answer: &AnswerRecord,
    ) -> Result<usize, SkipReason> {
        let question_id = answer
            .question_id
            .filter(|id| *id >= 1)
            .ok_or(SkipReason::MissingQuestionId)?;
        let payload = answer.payload()?;

        let script = self.apply_script(question_id, &payload);
        let value: JsonValue = executor.eval(script).await.map_err(|e| {
            // 页面侧执行失败按控件缺失处理：逐条降级，不上抛
            debug!("[题目 {}] 注入脚本执行失败: {}", question_id, e);
            SkipReason::InputMissing
        })?;
        let outcome: ApplyOutcome =
            serde_json::from_value(value).map_err(|_| SkipReason::InputMissing)?;

        if outcome.status != "applied" {
            return Err(map_reason(outcome.reason.as_deref()));
        }

        if let Some(tokens) = &answer.tokens_used {
            debug!("[题目 {}] token 用量: {}", question_id, tokens);
        }
        info!(
            "[题目 {}] ✓ 已作答（{} 次模拟点击）",
            question_id, outcome.activations
        );
        Ok(outcome.activations)
    }

    /// 按载荷类型生成注入脚本（容器在脚本里现查现用）
    fn apply_script(&self, question_id: u32, payload: &AnswerPayload) -> String {
        let index = (question_id - 1) as usize;
        match payload {
            AnswerPayload::Mcq { indices } | AnswerPayload::Msq { indices } => {
                self.choice_script(index, indices)
            }
            AnswerPayload::Numerical { text } => self.numerical_script(index, text),
        }
    }

    /// 选择题：对每个目标下标模拟一次点击；已选中的控件原样放过
    fn choice_script(&self, index: usize, indices: &[usize]) -> String {
        format!(
            r#"
            (() => {{
                const rows = document.querySelectorAll({container});
                const row = rows[{index}];
                if (!row) return {{ status: 'skipped', reason: 'container-missing' }};
                const box = row.querySelector({choices});
                if (!box) return {{ status: 'skipped', reason: 'input-missing' }};
                const inputs = box.querySelectorAll('input');
                let activations = 0;
                for (const i of {indices}) {{
                    const input = inputs[i];
                    if (!input) continue;
                    if (!input.checked) {{
                        input.click();
                        activations += 1;
                    }}
                }}
                return {{ status: 'applied', activations: activations }};
            }})()
            "#,
            container = js_string(&self.selectors.question_container),
            choices = js_string(&self.selectors.choices_container),
            index = index,
            indices = serde_json::to_string(indices).expect("下标序列化不会失败"),
        )
    }

    /// 填空题：写入值后连发 input、change 两个冒泡事件，让宿主框架感知
    fn numerical_script(&self, index: usize, text: &str) -> String {
        format!(
            r#"
            (() => {{
                const rows = document.querySelectorAll({container});
                const row = rows[{index}];
                if (!row) return {{ status: 'skipped', reason: 'container-missing' }};
                const input = row.querySelector({free_input});
                if (!input) return {{ status: 'skipped', reason: 'input-missing' }};
                input.value = {text};
                input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                input.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ status: 'applied', activations: 0 }};
            }})()
            "#,
            container = js_string(&self.selectors.question_container),
            free_input = js_string(&format!("{} input", self.selectors.free_response)),
            index = index,
            text = js_string(text),
        )
    }
}

/// 页面侧的跳过原因翻译成统一的 `SkipReason`
fn map_reason(reason: Option<&str>) -> SkipReason {
    match reason {
        Some("container-missing") => SkipReason::ContainerMissing,
        _ => SkipReason::InputMissing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Selectors;

    fn injector() -> AnswerInjector {
        AnswerInjector::new(&Selectors::default())
    }

    #[test]
    fn test_choice_script_targets_container_by_position() {
        let script = injector().choice_script(2, &[0, 3]);
        assert!(script.contains("rows[2]"));
        assert!(script.contains("[0,3]"));
        assert!(script.contains("input.click()"));
        // 幂等保障：只点未选中的控件
        assert!(script.contains("!input.checked"));
    }

    #[test]
    fn test_numerical_script_fires_input_then_change() {
        let script = injector().numerical_script(0, "9.81");
        assert!(script.contains(r#""9.81""#));
        let input_pos = script.find("new Event('input'").unwrap();
        let change_pos = script.find("new Event('change'").unwrap();
        assert!(input_pos < change_pos);
        assert!(script.contains("bubbles: true"));
    }

    #[test]
    fn test_numerical_script_escapes_text() {
        // 答案文本里的引号不能把脚本撑破
        let script = injector().numerical_script(0, r#"他说"对""#);
        assert!(script.contains(r#""他说\"对\"""#));
    }

    #[test]
    fn test_apply_script_dispatches_on_payload() {
        let inj = injector();
        let mcq = inj.apply_script(1, &AnswerPayload::Mcq { indices: vec![1] });
        assert!(mcq.contains("click"));
        let num = inj.apply_script(
            1,
            &AnswerPayload::Numerical {
                text: "42".to_string(),
            },
        );
        assert!(num.contains("dispatchEvent"));
    }

    #[test]
    fn test_map_reason() {
        assert_eq!(
            map_reason(Some("container-missing")),
            SkipReason::ContainerMissing
        );
        assert_eq!(map_reason(Some("input-missing")), SkipReason::InputMissing);
        assert_eq!(map_reason(None), SkipReason::InputMissing);
    }
}

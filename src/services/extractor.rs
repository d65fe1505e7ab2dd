//! 题目提取服务 - 业务能力层
//!
//! 只负责"把页面上的题目扫成结构化记录"这一件事，不关心流程。
//!
//! 提取分两步：先在页面上下文里跑一段快照脚本，对每个扫描到的容器
//! 产出一条原始记录（DOM 读取全部集中在这一步）；然后在 Rust 侧做
//! 归一化、分类和编号，这部分是纯函数，可以脱离浏览器测试。

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Selectors;
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::js_executor::js_string;
use crate::infrastructure::JsExecutor;
use crate::models::question::{QuestionRecord, QuestionType};

/// 快照脚本对单个容器的原始读取结果
///
/// 字段直接对应 DOM 现状，不做任何归一化；`body_text` 为 None 表示
/// 容器里根本没有题干节点（即它不是题目容器）。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContainer {
    pub body_text: Option<String>,
    pub image_url: Option<String>,
    pub has_choices: bool,
    /// 选项子容器里第一个 input 的 type 属性（"checkbox" / "radio" / …）
    pub first_input_type: Option<String>,
    pub option_labels: Vec<String>,
    pub has_free_response: bool,
    pub group_intro_text: Option<String>,
}

/// 题目提取服务
///
/// 职责：
/// - 扫描页面上的题目容器，产出有序的 `QuestionRecord` 批次
/// - 只读 DOM，绝不改 DOM
/// - 不关心流程顺序，不发起任何网络调用
pub struct QuestionExtractor {
    selectors: Selectors,
    whitespace: Regex,
}

impl QuestionExtractor {
    /// 创建新的提取服务
    pub fn new(selectors: &Selectors) -> Self {
        Self {
            selectors: selectors.clone(),
            // Unicode 模式下 \s 已涵盖不间断空格等全部空白
            whitespace: Regex::new(r"\s+").expect("空白正则必定合法"),
        }
    }

    /// 扫描当前页面并产出归一化的题目批次
    ///
    /// 页面上没有任何匹配容器时返回空序列（由编排层决定中止），DOM
    /// 结构缺胳膊少腿只会让个别容器被跳过，不会让整次提取失败。
    pub async fn extract(&self, executor: &JsExecutor) -> AppResult<Vec<QuestionRecord>> {
        let value = executor.eval(self.snapshot_script()).await.map_err(|e| {
            AppError::Browser(BrowserError::ScriptExecutionFailed { source: e.into() })
        })?;

        let snapshot: Vec<RawContainer> =
            serde_json::from_value(value).map_err(AppError::snapshot_decode_failed)?;

        let records = self.build_records(&snapshot);
        info!(
            "🔎 扫描到 {} 个容器，提取出 {} 道题目",
            snapshot.len(),
            records.len()
        );
        Ok(records)
    }

    /// 把原始快照归一化成题目记录（纯函数）
    ///
    /// `question_id` 恒等于容器在快照里的 1 起始位置：被跳过的容器只是
    /// 不产出记录，后续题目的编号不前移——注入阶段按 `question_id - 1`
    /// 回查容器列表，全靠这一点对得上号。
    pub fn build_records(&self, snapshot: &[RawContainer]) -> Vec<QuestionRecord> {
        let mut records = Vec::new();

        for (position, raw) in snapshot.iter().enumerate() {
            let question_id = (position + 1) as u32;

            // 没有题干节点的容器不是题目容器
            let Some(body) = raw.body_text.as_deref() else {
                debug!("容器 {} 没有题干节点，跳过", question_id);
                continue;
            };

            let question_text = self.normalize(body);
            let image_url = raw
                .image_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(str::to_string);

            // 题干与配图双缺的容器静默排除；编号占位保留
            if question_text.is_empty() && image_url.is_none() {
                debug!("容器 {} 既无题干也无配图，排除", question_id);
                continue;
            }

            let (question_type, options) = self.classify(raw);
            let case_study_text = raw
                .group_intro_text
                .as_deref()
                .map(|text| self.normalize(text))
                .unwrap_or_default();

            records.push(QuestionRecord {
                question_id,
                question_type,
                question_text,
                case_study_text,
                image_url,
                options,
            });
        }

        records
    }

    /// 判定题型并收集选项
    ///
    /// 有选项容器时看第一个输入控件：多选控件 => 多选题，否则单选题；
    /// 没有选项但有填空容器 => 填空题；两者都没有按空选项单选兜底。
    fn classify(&self, raw: &RawContainer) -> (QuestionType, Vec<String>) {
        if raw.has_choices {
            let question_type = if raw.first_input_type.as_deref() == Some("checkbox") {
                QuestionType::Msq
            } else {
                QuestionType::Mcq
            };
            let options = raw
                .option_labels
                .iter()
                .map(|label| self.normalize(label))
                .collect();
            (question_type, options)
        } else if raw.has_free_response {
            (QuestionType::Numerical, Vec::new())
        } else {
            (QuestionType::Mcq, Vec::new())
        }
    }

    /// 折叠连续空白为单个空格并去掉首尾空白
    fn normalize(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }

    /// 页面快照脚本：每个容器读一条原始记录
    fn snapshot_script(&self) -> String {
        let s = &self.selectors;
        format!(
            r#"
            (() => {{
                const rows = Array.from(document.querySelectorAll({container}));
                return rows.map((row) => {{
                    const body = row.querySelector({body});
                    const img = row.querySelector({image});
                    const choicesBox = row.querySelector({choices});
                    const freeBox = row.querySelector({free});
                    const group = row.closest({group});
                    const intro = group ? group.querySelector({intro}) : null;
                    const firstInput = choicesBox ? choicesBox.querySelector('input') : null;
                    return {{
                        body_text: body ? (body.textContent || '') : null,
                        image_url: img ? (img.src || null) : null,
                        has_choices: !!choicesBox,
                        first_input_type: firstInput ? (firstInput.type || null) : null,
                        option_labels: choicesBox
                            ? Array.from(choicesBox.querySelectorAll('label')).map((l) => l.textContent || '')
                            : [],
                        has_free_response: !!freeBox,
                        group_intro_text: intro ? (intro.textContent || '') : null,
                    }};
                }});
            }})()
            "#,
            container = js_string(&s.question_container),
            body = js_string(&s.question_body),
            image = js_string(&s.question_image),
            choices = js_string(&s.choices_container),
            free = js_string(&s.free_response),
            group = js_string(&s.group_ancestor),
            intro = js_string(&s.group_intro),
        )
    }
}

//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"在页面上下文里执行 JS"的能力。
//! 页面的 JS 世界就是受限前台上下文：提取和注入都从这里走，出站的
//! 求解请求绝不从这里发。

use anyhow::Result;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / eval_as() 能力
/// - 不认识题目、答案等业务类型
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于注册绑定等页面级操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 在页面上下文执行 JS 并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 在页面上下文执行 JS 并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}

/// 把 Rust 字符串安全地嵌进 JS 源码
///
/// JSON 字符串字面量在 JS 里原样合法，顺带处理了引号和转义。
pub fn js_string(text: &str) -> String {
    serde_json::to_string(text).expect("字符串序列化不会失败")
}

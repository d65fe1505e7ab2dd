//! 激活通道 - 编排层
//!
//! 触发方式是文档级的固定快捷键。监听器注入页面，命中组合键时经
//! CDP 绑定回调到本进程；绑定由编排层启动时注册一次、关停时注销，
//! 生命周期不归页面管。

use phf::phf_map;
use thiserror::Error;

use crate::infrastructure::js_executor::js_string;

/// 修饰键名到 KeyboardEvent 属性名的映射
static MODIFIER_PROPS: phf::Map<&'static str, &'static str> = phf_map! {
    "ctrl" => "ctrlKey",
    "control" => "ctrlKey",
    "shift" => "shiftKey",
    "alt" => "altKey",
    "meta" => "metaKey",
    "cmd" => "metaKey",
};

/// 快捷键解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyParseError {
    #[error("缺少主键（形如 \"alt+s\"）")]
    MissingKey,
    #[error("主键只能是单个字符，得到 '{0}'")]
    InvalidKey(String),
    #[error("出现了多个主键: '{0}'")]
    DuplicateKey(String),
}

/// 解析后的快捷键组合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    /// 需要按下的修饰键（KeyboardEvent 属性名，去重后保序）
    modifiers: Vec<&'static str>,
    /// 主键（小写）
    key: char,
}

impl Hotkey {
    /// 解析形如 "alt+s"、"ctrl+shift+x" 的组合串
    pub fn parse(combo: &str) -> Result<Self, HotkeyParseError> {
        let mut modifiers: Vec<&'static str> = Vec::new();
        let mut key: Option<char> = None;

        for part in combo.split('+') {
            let part = part.trim().to_lowercase();
            if part.is_empty() {
                continue;
            }
            if let Some(&prop) = MODIFIER_PROPS.get(part.as_str()) {
                if !modifiers.contains(&prop) {
                    modifiers.push(prop);
                }
                continue;
            }
            let mut chars = part.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    if key.replace(c).is_some() {
                        return Err(HotkeyParseError::DuplicateKey(part));
                    }
                }
                _ => return Err(HotkeyParseError::InvalidKey(part)),
            }
        }

        let key = key.ok_or(HotkeyParseError::MissingKey)?;
        Ok(Self { modifiers, key })
    }

    /// 生成注入页面的 keydown 监听脚本
    ///
    /// 命中组合键时调用 `window[binding]`（由 Runtime.addBinding 提供）。
    /// 脚本自带安装标记，重复注入不会叠加监听器。
    pub fn listener_script(&self, binding: &str) -> String {
        let mut conditions: Vec<String> = self
            .modifiers
            .iter()
            .map(|prop| format!("e.{}", prop))
            .collect();
        conditions.push(format!(
            "e.key.toLowerCase() === {}",
            js_string(&self.key.to_string())
        ));
        let predicate = conditions.join(" && ");

        format!(
            r#"
            (() => {{
                if (window.__solveTriggerInstalled) return true;
                window.__solveTriggerInstalled = true;
                document.addEventListener('keydown', (e) => {{
                    if ({predicate}) {{
                        e.preventDefault();
                        if (typeof window[{binding}] === 'function') {{
                            window[{binding}]('solve');
                        }}
                    }}
                }});
                return true;
            }})()
            "#,
            predicate = predicate,
            binding = js_string(binding),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_combo() {
        let hotkey = Hotkey::parse("alt+s").unwrap();
        assert_eq!(hotkey.modifiers, vec!["altKey"]);
        assert_eq!(hotkey.key, 's');
    }

    #[test]
    fn test_parse_multi_modifier_combo() {
        let hotkey = Hotkey::parse("Ctrl+Shift+X").unwrap();
        assert_eq!(hotkey.modifiers, vec!["ctrlKey", "shiftKey"]);
        assert_eq!(hotkey.key, 'x');
    }

    #[test]
    fn test_parse_modifier_aliases_dedupe() {
        let hotkey = Hotkey::parse("ctrl+control+s").unwrap();
        assert_eq!(hotkey.modifiers, vec!["ctrlKey"]);
    }

    #[test]
    fn test_parse_rejects_bad_combos() {
        assert_eq!(Hotkey::parse("alt+shift"), Err(HotkeyParseError::MissingKey));
        assert_eq!(
            Hotkey::parse("alt+enter"),
            Err(HotkeyParseError::InvalidKey("enter".to_string()))
        );
        assert_eq!(
            Hotkey::parse("a+b"),
            Err(HotkeyParseError::DuplicateKey("b".to_string()))
        );
    }

    #[test]
    fn test_listener_script_checks_modifiers_and_key() {
        let script = Hotkey::parse("alt+s")
            .unwrap()
            .listener_script("__solveExamTrigger");
        assert!(script.contains("e.altKey"));
        assert!(script.contains(r#"e.key.toLowerCase() === "s""#));
        assert!(script.contains(r#"window["__solveExamTrigger"]"#));
        // 防重复安装标记
        assert!(script.contains("__solveTriggerInstalled"));
    }
}

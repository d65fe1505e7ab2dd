use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppResult, ConfigError};

/// 程序配置文件
///
/// 优先级：环境变量 > config.toml > 默认值
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口（附着模式）
    pub browser_debug_port: u16,
    /// 是否自行启动无头浏览器（false 时附着到已运行的浏览器）
    pub launch_headless: bool,
    /// 考试页面 URL
    pub target_url: String,
    /// 目标页面标题（附着模式下用于挑选已打开的标签页）
    pub target_title: Option<String>,
    /// 求解服务地址
    pub solver_api_url: String,
    /// 求解请求超时（秒）
    pub solver_timeout_secs: u64,
    /// 是否走中继通道（false 时提取方直接调用求解客户端）
    pub use_relay: bool,
    /// 触发快捷键组合，如 "alt+s"、"ctrl+shift+x"
    pub trigger_combo: String,
    /// 注入完成到点击交卷之间的静置时间（毫秒）
    pub submit_settle_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 考试页面的 DOM 选择器约定
    pub selectors: Selectors,
}

/// 考试页面的 DOM 选择器约定
///
/// 这组选择器是宿主页面对外的"接口"，默认值对应目标考试系统的固定结构。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// 重复出现的题目容器
    pub question_container: String,
    /// 题干节点（容器内）
    pub question_body: String,
    /// 配图节点（容器内，可选）
    pub question_image: String,
    /// 选项子容器（容器内，可选）
    pub choices_container: String,
    /// 填空作答子容器（容器内，可选）
    pub free_response: String,
    /// 题组祖先节点（容器外层，可选）
    pub group_ancestor: String,
    /// 题组导语节点（题组内）
    pub group_intro: String,
    /// 交卷按钮的固定 id
    pub submit_button_id: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            question_container: ".question-container".to_string(),
            question_body: ".question-statement".to_string(),
            question_image: "img.question-image".to_string(),
            choices_container: ".answer-choices".to_string(),
            free_response: ".free-response".to_string(),
            group_ancestor: ".question-group".to_string(),
            group_intro: ".group-introduction".to_string(),
            submit_button_id: "exam-submit".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            launch_headless: false,
            target_url: "about:blank".to_string(),
            target_title: None,
            solver_api_url: "http://127.0.0.1:5000/api/solve".to_string(),
            solver_timeout_secs: 120,
            use_relay: true,
            trigger_combo: "alt+s".to_string(),
            submit_settle_ms: 800,
            verbose_logging: false,
            selectors: Selectors::default(),
        }
    }
}

impl Config {
    /// 加载配置：先读 config.toml（若存在），再套用环境变量覆盖
    pub fn load() -> Self {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut config = match Self::from_file(&path) {
            Ok(c) => {
                debug!("已加载配置文件: {}", path);
                c
            }
            Err(e) => {
                if std::path::Path::new(&path).exists() {
                    warn!("{}，使用默认配置", e);
                } else {
                    debug!("未找到配置文件 {}，使用默认配置", path);
                }
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// 从 TOML 文件读取配置
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadFailed {
                path: path.to_string(),
                source: Box::new(e),
            })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source: Box::new(e),
        })?;
        Ok(config)
    }

    /// 套用环境变量覆盖（未设置的变量保持原值）
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("BROWSER_DEBUG_PORT") {
            self.browser_debug_port = v;
        }
        if let Some(v) = env_parse("LAUNCH_HEADLESS") {
            self.launch_headless = v;
        }
        if let Ok(v) = std::env::var("TARGET_URL") {
            self.target_url = v;
        }
        if let Ok(v) = std::env::var("TARGET_TITLE") {
            self.target_title = Some(v);
        }
        if let Ok(v) = std::env::var("SOLVER_API_URL") {
            self.solver_api_url = v;
        }
        if let Some(v) = env_parse("SOLVER_TIMEOUT_SECS") {
            self.solver_timeout_secs = v;
        }
        if let Some(v) = env_parse("USE_RELAY") {
            self.use_relay = v;
        }
        if let Ok(v) = std::env::var("TRIGGER_COMBO") {
            self.trigger_combo = v;
        }
        if let Some(v) = env_parse("SUBMIT_SETTLE_MS") {
            self.submit_settle_ms = v;
        }
        if let Some(v) = env_parse("VERBOSE_LOGGING") {
            self.verbose_logging = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.browser_debug_port, 9222);
        assert!(config.use_relay);
        assert_eq!(config.solver_api_url, "http://127.0.0.1:5000/api/solve");
        assert_eq!(config.selectors.submit_button_id, "exam-submit");
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml_text = r#"
            solver_api_url = "http://10.0.0.2:8000/api/solve"
            use_relay = false

            [selectors]
            submit_button_id = "finish-btn"
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.solver_api_url, "http://10.0.0.2:8000/api/solve");
        assert!(!config.use_relay);
        assert_eq!(config.selectors.submit_button_id, "finish-btn");
        // 未覆盖的字段保持默认
        assert_eq!(config.browser_debug_port, 9222);
        assert_eq!(config.selectors.question_container, ".question-container");
    }
}

//! 日志工具模块
//!
//! 提供日志初始化和格式化辅助函数

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// 过滤级别取 RUST_LOG 环境变量，未设置时默认 info。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("🚀 自动作答程序启动 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    tracing::info!(
        "📡 求解服务: {} (超时 {} 秒)",
        config.solver_api_url,
        config.solver_timeout_secs
    );
    tracing::info!(
        "🔀 部署形态: {}",
        if config.use_relay {
            "双上下文（经中继）"
        } else {
            "单上下文（直连）"
        }
    );
    tracing::info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        let long = "这是一段相当长的题干文本需要截断显示";
        let truncated = truncate_text(long, 6);
        assert_eq!(truncated, "这是一段相当...");
    }
}

//! 应用外壳 - 编排层

use std::sync::Arc;

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::{
    AddBindingParams, EventBindingCalled, RemoveBindingParams,
};
use chromiumoxide::Browser;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::browser;
use crate::clients::SolverClient;
use crate::config::Config;
use crate::error::{AppError, ConfigError};
use crate::infrastructure::{spawn_relay_worker, JsExecutor};
use crate::orchestrator::trigger::Hotkey;
use crate::utils::logging;
use crate::workflow::{DirectCall, ExamPipeline, RelayedCall, SolveStrategy};

/// 触发绑定名（Runtime.addBinding 暴露给页面的函数名）
const TRIGGER_BINDING: &str = "__solveExamTrigger";

/// 应用主结构
pub struct App {
    config: Config,
    /// 持有连接让它活到事件循环结束
    _browser: Browser,
    executor: Arc<JsExecutor>,
    pipeline: Arc<ExamPipeline>,
}

impl App {
    /// 初始化应用：接好浏览器、选好征询策略、组装流水线
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        // 连接或启动浏览器
        let (browser, page) = if config.launch_headless {
            browser::launch_headless_browser(&config.target_url).await?
        } else {
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                Some(&config.target_url),
                config.target_title.as_deref(),
            )
            .await?
        };
        let executor = Arc::new(JsExecutor::new(page));

        // 出站调用只属于特权一侧：按部署形态选征询策略
        let client = SolverClient::new(&config)?;
        let strategy: Box<dyn SolveStrategy> = if config.use_relay {
            Box::new(RelayedCall::new(spawn_relay_worker(client)))
        } else {
            Box::new(DirectCall::new(client))
        };

        let pipeline = Arc::new(ExamPipeline::new(&config, executor.clone(), strategy));

        Ok(Self {
            config,
            _browser: browser,
            executor,
            pipeline,
        })
    }

    /// 运行事件循环：等触发、跑流水线，直到 Ctrl+C
    pub async fn run(self) -> Result<()> {
        let hotkey = Hotkey::parse(&self.config.trigger_combo).map_err(|e| {
            AppError::Config(ConfigError::InvalidHotkey {
                combo: self.config.trigger_combo.clone(),
                reason: e.to_string(),
            })
        })?;

        self.install_trigger(&hotkey).await?;
        info!(
            "⌨️ 在考试页面按 {} 触发作答（Ctrl+C 退出）",
            self.config.trigger_combo
        );

        let mut events = self
            .executor
            .page()
            .event_listener::<EventBindingCalled>()
            .await?;

        loop {
            tokio::select! {
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(event) if event.name == TRIGGER_BINDING => {
                            // 快速预判，权威的再入判定在流水线的闸门里
                            if !self.pipeline.is_idle() {
                                warn!("⏳ 上一轮流程在途，忽略本次触发");
                                continue;
                            }
                            let pipeline = self.pipeline.clone();
                            tokio::spawn(async move {
                                let outcome = pipeline.run().await;
                                info!("🏁 本轮结局: {:?}", outcome);
                            });
                        }
                        Some(_) => {}
                        None => {
                            warn!("浏览器事件流结束，退出");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("收到退出信号");
                    break;
                }
            }
        }

        self.remove_trigger().await;
        Ok(())
    }

    /// 注册触发绑定并在当前文档与后续导航中安装监听（启动时一次）
    async fn install_trigger(&self, hotkey: &Hotkey) -> Result<()> {
        let page = self.executor.page();

        let binding = AddBindingParams::builder()
            .name(TRIGGER_BINDING)
            .build()
            .map_err(|e| anyhow::anyhow!("构造绑定参数失败: {}", e))?;
        page.execute(binding).await?;

        let script = hotkey.listener_script(TRIGGER_BINDING);

        // 页面刷新/重导航后监听依旧有效
        let on_new_document = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(script.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("构造注入脚本参数失败: {}", e))?;
        page.execute(on_new_document).await?;

        // 当前文档立即装上
        self.executor.eval(script).await?;
        debug!("触发监听已安装 (绑定: {})", TRIGGER_BINDING);
        Ok(())
    }

    /// 注销触发绑定（关停时一次）
    async fn remove_trigger(&self) {
        let removal = RemoveBindingParams::builder()
            .name(TRIGGER_BINDING)
            .build();
        match removal {
            Ok(params) => {
                if let Err(e) = self.executor.page().execute(params).await {
                    warn!("注销触发绑定失败: {}", e);
                } else {
                    debug!("触发绑定已注销");
                }
            }
            Err(e) => warn!("构造注销参数失败: {}", e),
        }
    }
}

pub mod js_executor;
pub mod relay;

pub use js_executor::JsExecutor;
pub use relay::{spawn_relay_worker, RelayError, RelayHandle, RelayMessage, RelayResponse};

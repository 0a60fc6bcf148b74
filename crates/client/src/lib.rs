pub mod http;
pub mod proxy;
pub mod renderer;
pub mod robots;

pub use http::{Fetcher, DEFAULT_TIMEOUT_SECS};
pub use proxy::ProxyRotator;
pub use renderer::JsRenderer;
pub use robots::RobotsCache;

mod analysis;
mod config;
mod content;
mod error;
mod gateway;
mod session;
#[cfg(test)]
mod test_support;
mod transport;
pub mod views;

pub use analysis::{AnalysisRequest, ANALYSIS_FALLBACK_TEXT, DEFAULT_ANALYSIS_PROMPT};
pub use config::{GatewayConfig, GenerationOptions, DEFAULT_API_BASE, DEFAULT_THINKING_BUDGET};
pub use error::GatewayError;
pub use gateway::Gateway;
pub use session::{ChatSession, CHAT_FALLBACK_TEXT};
pub use transport::{GeminiTransport, ModelTransport};

pub mod agent;
pub mod bridge;
pub mod config;
pub mod error;
pub mod input;
pub mod logger;
pub mod render;
pub mod session;

// Re-exports for convenience
pub use agent::{AgentClient, AgentEvent, PermissionDecision, PermissionHandler, UserMessage};
pub use bridge::MessageBridge;
pub use config::{Config, PermissionMode};
pub use error::{Result, TetherError};
pub use input::{CancelOutcome, InputEvent, InputHandler, LineDisposition, PermissionAnswer};
pub use render::Renderer;
pub use session::{Session, SessionStats};

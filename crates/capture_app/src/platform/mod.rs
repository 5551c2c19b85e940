mod app;
mod logging;
mod persistence;

pub use app::{run_agent, AgentOptions};

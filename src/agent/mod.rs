
mod agent;
mod history;

pub use agent::{Agent, AgentConfig, QueryError};

#[cfg(test)]
pub use agent::LoopState;
#[cfg(test)]
pub use history::ConversationHistory;

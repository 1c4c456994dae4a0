pub mod players;
pub mod stats;

pub use players::{AgentInstance, CLI_AGENTS, CliAgent, agent_name, create_agent, print_agent_help};
pub use stats::{GameStats, GameSummary};

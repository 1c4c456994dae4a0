use std::sync::Arc;

use crate::game::{GameSession, Move, PlayerId};
use crate::players::heuristics::GENETIC2_WEIGHTS;
use crate::players::{
    Agent, LiteMonteCarloAgent, MonteCarloAgent, OneMoveAgent, OptimizedAgent, RandomAgent,
    SearchBudget, Weighted,
};

const LITE_DEFAULT_ITERATIONS: usize = 10;

pub struct CliAgent {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CLI_AGENTS: &[CliAgent] = &[
    CliAgent {
        code: "R",
        name: "RandomAgent",
        description: "Picks a move category at random, then a move within it.",
    },
    CliAgent {
        code: "O",
        name: "OneMoveAgent",
        description: "Plays the move whose resulting state scores best (AmossComb1 weights).",
    },
    CliAgent {
        code: "P",
        name: "ProbabilityAgent",
        description: "One-move agent maximizing roll probability of current and reachable spots.",
    },
    CliAgent {
        code: "M",
        name: "MonteCarloAgent",
        description: "Averages heuristic rollouts per move. Params: ITERATIONS[:DEPTH].",
    },
    CliAgent {
        code: "G",
        name: "GeneticMonteCarloAgent",
        description: "Monte Carlo with genetically tuned weights. Params: ITERATIONS[:DEPTH].",
    },
    CliAgent {
        code: "L",
        name: "LiteMonteCarloAgent",
        description: "Best-of rollouts with a remembered path. Params: ITERATIONS.",
    },
    CliAgent {
        code: "X",
        name: "OptimizedAgent",
        description: "One-move agent with monopoly and trade preferences.",
    },
];

pub enum AgentInstance {
    Random(RandomAgent),
    OneMove(OneMoveAgent),
    MonteCarlo(MonteCarloAgent),
    Lite(LiteMonteCarloAgent),
    Optimized(OptimizedAgent),
}

impl Agent for AgentInstance {
    fn choose(&mut self, moves: &[Move], player: PlayerId, session: &GameSession) -> Option<Move> {
        match self {
            AgentInstance::Random(a) => a.choose(moves, player, session),
            AgentInstance::OneMove(a) => a.choose(moves, player, session),
            AgentInstance::MonteCarlo(a) => a.choose(moves, player, session),
            AgentInstance::Lite(a) => a.choose(moves, player, session),
            AgentInstance::Optimized(a) => a.choose(moves, player, session),
        }
    }
}

/// Builds the agent for a seat code such as `M:4:1`. Returns `None` for an
/// unknown code or an unparsable parameter.
pub fn create_agent(code: &str, params: &[&str], seed: u64) -> Option<AgentInstance> {
    let param = |idx: usize, default: usize| -> Option<usize> {
        match params.get(idx) {
            Some(raw) => raw.parse().ok(),
            None => Some(default),
        }
    };
    let agent = match code {
        "R" => AgentInstance::Random(RandomAgent::with_seed(seed)),
        "O" => AgentInstance::OneMove(OneMoveAgent::amoss(seed)),
        "P" => AgentInstance::OneMove(OneMoveAgent::probability(seed)),
        "M" | "G" => {
            let weights = if code == "G" {
                Weighted::everything(GENETIC2_WEIGHTS)
            } else {
                Weighted::default()
            };
            let budget = SearchBudget::new(param(0, 1)?, param(1, 0)?);
            AgentInstance::MonteCarlo(MonteCarloAgent::new(Arc::new(weights), budget, seed))
        }
        "L" => {
            let budget = SearchBudget::new(param(0, LITE_DEFAULT_ITERATIONS)?, 0);
            AgentInstance::Lite(LiteMonteCarloAgent::new(
                Arc::new(Weighted::default()),
                budget,
                seed,
            ))
        }
        "X" => AgentInstance::Optimized(OptimizedAgent::new(Arc::new(Weighted::default()), seed)),
        _ => return None,
    };
    Some(agent)
}

pub fn agent_name(code: &str) -> &'static str {
    CLI_AGENTS
        .iter()
        .find(|a| a.code == code)
        .map_or("Unknown", |a| a.name)
}

pub fn print_agent_help() {
    println!("Agent Legend:");
    println!("{:<5} {:<25} DESCRIPTION", "CODE", "AGENT");
    println!("{}", "-".repeat(80));
    for agent in CLI_AGENTS {
        println!("{:<5} {:<25} {}", agent.code, agent.name, agent.description);
    }
}

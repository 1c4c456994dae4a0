pub mod base;
pub mod heuristic;
pub mod heuristics;
pub mod monte_carlo;
pub mod random;

pub use base::Agent;
pub use heuristic::{OneMoveAgent, OptimizedAgent};
pub use heuristics::{Feature, Heuristic, Weighted};
pub use monte_carlo::{LiteMonteCarloAgent, MonteCarloAgent, SearchBudget};
pub use random::RandomAgent;

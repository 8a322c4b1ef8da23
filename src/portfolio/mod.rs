pub mod aggregator;
pub mod coordinator;
pub mod rollup;

pub use aggregator::{AggregatorConfig, PortfolioAggregator};
pub use coordinator::RefreshCoordinator;
pub use rollup::{allocate, history, performance, summarize, PortfolioAllocation, PortfolioSummary};

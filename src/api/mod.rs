pub mod format;

pub use format::{StrategyIndex, StrategyListing, StrategyWithCards, ThreadView};

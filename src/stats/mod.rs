pub mod describe;
pub mod distribution;
pub mod hypothesis;

pub use describe::{describe, summarize, Summary};
pub use hypothesis::{advantage_test, AdvantageTable, AdvantageTest};

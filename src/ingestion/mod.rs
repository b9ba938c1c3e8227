pub mod cleaner;
pub mod features;
pub mod loader;

pub use cleaner::{clean, AttributeRange};
pub use features::{derive_differences, exclude_draws, exclude_for};
pub use loader::{load_csv, read_bouts};

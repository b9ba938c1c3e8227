pub mod balancer;
pub mod folds;

pub use balancer::balance;
pub use folds::{stratified_folds, Folds};

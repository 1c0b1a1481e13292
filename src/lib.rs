use config::Config;
use lazy_static::lazy_static;
use std::sync::Arc;

pub mod assembly;
pub mod builder;
pub mod config;
pub mod design;
pub mod dna;
pub mod fragment;
pub mod pareto;
pub mod primers;
pub mod seq_match;

lazy_static! {
    // Builtin cost and length settings
    pub static ref DEFAULT_CONFIG: Arc<Config> = Arc::new(Config::default());
}

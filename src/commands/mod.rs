pub mod config;
pub mod prompt;
pub mod report;
pub mod usage;
pub mod utils;

pub use utils::init_logging;

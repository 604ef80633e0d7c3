/// Platform helpers shared by the state store and report export

pub mod common;

pub use common::{atomic_write, ensure_directory_exists, remove_if_exists};

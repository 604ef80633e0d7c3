pub mod limits;
pub mod platform;

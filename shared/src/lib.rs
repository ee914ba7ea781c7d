// Data models and numeric helpers shared by the engine crate.
pub mod models;
pub mod utils;

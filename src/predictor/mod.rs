pub mod core;
pub mod label;
pub mod main;
pub mod render;
pub mod run_effect;

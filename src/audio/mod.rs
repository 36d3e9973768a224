pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod queue;
pub mod registry;
pub mod state;
pub mod system;
pub mod track;
pub mod traits;

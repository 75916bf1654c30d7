pub mod budget;
pub mod cli;
pub mod config;
pub mod convert;
pub mod core;
pub mod exit;
pub mod generate;
pub mod logs;
pub mod platform;
pub mod render;
pub mod ui;

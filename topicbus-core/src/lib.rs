pub const TOPIC_BUS_CONFIG: &'static str = include_str!("../bus.toml");

pub mod config;
pub mod error;
pub mod event;
pub mod ext;

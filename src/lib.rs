pub mod bot;
pub mod config;
pub mod generator;
pub mod health;
pub mod live;
pub mod location;
pub mod log;

pub mod body;
pub mod config;
pub mod engine;
pub mod game;
pub mod input;
pub mod level;
pub mod render;
pub mod vehicle;

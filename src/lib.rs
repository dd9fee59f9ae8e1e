pub mod action;
pub mod config;
pub mod docker;
pub mod doctor;
pub mod event;
pub mod frame;
pub mod input;
pub mod menu;
pub mod provider;
pub mod sim;
pub mod snake;
pub mod system;

mod app;

pub use app::*;

pub mod config;
pub mod scheduler;
pub mod util;

pub mod map;
pub mod path;
pub mod sim;

pub mod web_server;

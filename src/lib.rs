pub mod cli;
pub mod config;
pub mod db;
pub mod events;
pub mod global;
pub mod recordings;
pub mod sessions;
pub mod users;
pub mod webex;

pub mod artifact;
pub mod chunk;
pub mod config;
pub mod conversation;
pub mod document;
pub mod state;

pub mod clarify;
pub mod generator;
pub mod handlers;
pub mod persist;
pub mod prompts;

pub mod generation;
pub mod history;

pub mod args;
pub mod confirm;
pub mod render;
pub mod session;

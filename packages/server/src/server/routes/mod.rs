// HTTP routes
pub mod health;
pub mod register;

pub use health::*;
pub use register::*;

//! Data Transfer Objects (DTOs) for API requests and responses

pub mod call;
pub mod room;
pub mod webhook;

pub use call::*;
pub use room::*;
pub use webhook::*;


pub mod common;
pub mod kernel;
pub mod lang;

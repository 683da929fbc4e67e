//! Small helpers shared by the request and connect engines.

pub mod keep_alive;
pub mod mime;

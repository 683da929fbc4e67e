//! rama network types and utilities
//!
//! This crate provides the common network-level vocabulary shared by the
//! rest of rama: addresses that can be either a domain or an IP, and the
//! small parsing helpers built on top of them.
//!
//! Learn more about `rama`:
//!
//! - Github: <https://github.com/plabayo/rama>
//! - Book: <https://ramaproxy.org/book/>

#![cfg_attr(test, allow(clippy::float_cmp))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

pub mod address;

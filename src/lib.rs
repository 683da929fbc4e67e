//! Violentproxy: an intercepting HTTP/HTTPS proxy that terminates
//! client-side TLS with an on-the-fly, locally-trusted certificate
//! authority, lets a patcher inspect or rewrite traffic, and forwards it to
//! the real origin.
//!
//! The crate is organised around the six components of the design:
//!
//! - [`cert`] — the CA and on-demand leaf signer (C2).
//! - [`agent_pool`] — the keep-alive outbound connection pool (C1).
//! - [`tls_server`] — the dynamic, SNI-multiplexed TLS listener (C3).
//! - [`request_engine`] — forward-HTTP request handling (C4).
//! - [`connect_engine`] — `CONNECT` tunnel handling (C5).
//! - [`patcher`] — the externally-settable decision surface (C6).
//!
//! [`engine`] ties the six together into one `Engine` context that owns all
//! shared state, and [`config`] describes how that context is configured.

pub mod agent_pool;
pub mod cache_key;
pub mod cert;
pub mod config;
pub mod connect_engine;
pub mod engine;
mod fatal;
pub mod patcher;
pub mod request_engine;
pub mod tls_server;
mod util;
pub mod wire;

pub use config::Config;
pub use engine::Engine;

/// An in-memory, fully buffered HTTP request (§3 `RequestContext`): the
/// proxy never streams a body to or from a peer, so every request and
/// response in this crate carries its whole body as `Vec<u8>`.
pub type Req = rama_http_types::Request<Vec<u8>>;
/// An in-memory, fully buffered HTTP response; see [`Req`].
pub type Resp = rama_http_types::Response<Vec<u8>>;

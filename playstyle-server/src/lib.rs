//! # Playstyle Server
//!
//! Loopback service that lets a running game ask for a playstyle analysis
//! of everything it has recorded so far.
//!
//! ```text
//! TcpStream ──▶ LineCodec ──▶ parse_request ──▶ MessageHandler ──▶ Response
//!  (session)     (framing)      (protocol)        (handler)         (protocol)
//! ```
//!
//! - **Port**: first free port in a window, published to a discovery file
//! - **Service**: accept loop serving one [`session::ClientSession`] at a time
//! - **Framing**: newline-delimited UTF-8 JSON with a bounded buffer
//! - **Handler**: `PING`, `GAME_STATE` and `REQUEST_ANALYSIS` dispatch
//!
//! Failures are absorbed at the narrowest unit that can tolerate them; see
//! [`error::ErrorClass`].

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod error;
pub mod framing;
pub mod handler;
pub mod metrics;
pub mod port;
pub mod protocol;
pub mod service;
pub mod session;

pub use error::{ErrorClass, ServerError};
pub use handler::MessageHandler;
pub use service::Service;

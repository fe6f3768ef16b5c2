//! Test doubles shared by unit and integration tests.
//!
//! Available to integration tests through the `test-util` feature.

mod scripted_client;
mod shared_buf;

pub use scripted_client::{ClientCall, ScriptedClient, ScriptedToken};
pub use shared_buf::SharedBuf;

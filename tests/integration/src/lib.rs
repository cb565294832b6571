//! Integration test support
//!
//! An in-memory transport that lets tests play the server's side of the
//! gateway protocol against the real client.

pub mod mock;

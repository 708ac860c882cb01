//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `LedgerEngine`, the primary entry point for
//! executing commands. Every operation runs inside a single serialization
//! gate so that at most one read-modify-write is in flight at a time.

pub mod engine;

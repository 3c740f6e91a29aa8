//! Route Configuration Module
//!
//! HTTP route table for the backend server.

/// Router assembly
pub mod router;

pub use router::create_router;

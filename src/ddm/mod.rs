//! DDM publisher
//!
//! Authenticated access to the DDM API:
//! - /api/v1/contents - Bulk content publish
//! - /api/v1/health - Startup health probe

mod client;

pub use client::*;

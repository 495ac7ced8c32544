//! Listings HTTP service: routing, the request authorization gate, and
//! request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;

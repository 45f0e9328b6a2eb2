//! REST API server: routes, DTOs, CORS and rate-limit policy, OpenAPI documentation.

pub mod cors;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub mod auth_middleware;
pub mod cors;
pub mod rate_limit;

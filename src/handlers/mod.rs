pub mod healthcheck;
pub mod identity;

///! API middleware for authentication, role checks and CORS

pub mod auth;
pub mod cors;
pub mod rbac;

// handlers/protected/mod.rs - Endpoints open to any authenticated role
//
// Route prefix: /api/*
// Middleware: authenticate (bearer token → AuthUser)

pub mod commissions;
pub mod packages;
pub mod payment_methods;
pub mod profile;
pub mod wallet;

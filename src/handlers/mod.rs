// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no auth) → Protected (bearer auth, any role) → Elevated (role allow-list)
pub mod elevated;
pub mod protected;
pub mod public;

// handlers/elevated/mod.rs - Endpoints behind a role allow-list
//
// review      /api/review/*      admin, merchant
// accounting  /api/accounting/*  admin, accounting
// admin       /api/admin/*       admin

pub mod accounting;
pub mod admin;
pub mod review;

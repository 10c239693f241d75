// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token, `require_auth`)
pub mod protected;
pub mod public;

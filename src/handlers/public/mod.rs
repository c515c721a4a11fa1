// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: /api/auth/{register,login,refresh,logout}

pub mod auth;

pub use auth::*;

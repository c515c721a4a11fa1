// handlers/protected/mod.rs - Protected handlers (access token required)
//
// Route Prefix: /api/*
// Middleware: JWT validation, plus active-group validation for
// children, items, menus and alerts.

pub mod alerts;
pub mod auth;
pub mod children;
pub mod feed;
pub mod groups;
pub mod items;
pub mod menus;
pub mod schedules;

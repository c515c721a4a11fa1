// handlers/protected/auth/mod.rs - Account endpoints for authenticated users

pub mod profile;
pub mod switch_group;

pub use profile::{profile_get, profile_put};
pub use switch_group::switch_group_post;

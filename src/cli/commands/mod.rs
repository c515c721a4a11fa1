pub mod invites;
pub mod items;
pub mod menus;
pub mod schema;

// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require an access token.

pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;

pub use login::login_post;
pub use logout::logout_post;
pub use refresh::refresh_post;
pub use register::register_post;

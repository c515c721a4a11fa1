pub mod auth;
pub mod response;
pub mod validate_group;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult, IntoApiResponse};
pub use validate_group::{validate_group_middleware, ActiveGroup};

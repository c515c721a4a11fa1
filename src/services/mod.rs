pub mod access;
pub mod alert_service;
pub mod child_service;
pub mod error;
pub mod feed_service;
pub mod food_service;
pub mod group_service;
pub mod menu_service;
pub mod schedule_service;
pub mod user_service;

pub use alert_service::AlertService;
pub use child_service::ChildService;
pub use error::{ServiceError, ServiceResult};
pub use feed_service::FeedService;
pub use food_service::{FoodFilter, FoodService};
pub use group_service::GroupService;
pub use menu_service::MenuService;
pub use schedule_service::ScheduleService;
pub use user_service::UserService;

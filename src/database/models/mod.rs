pub mod alert;
pub mod child;
pub mod food;
pub mod group;
pub mod menu;
pub mod schedule;
pub mod user;

pub use alert::{Alert, AlertStatus};
pub use child::Child;
pub use food::Food;
pub use group::{Group, GroupInvite, GroupMember, GroupMembership, GroupSummary, Role};
pub use menu::{MealType, Menu, MenuItemView, MenuView};
pub use schedule::{Schedule, ScheduleItem};
pub use user::{Profile, User};

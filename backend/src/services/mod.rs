//! Business logic services for the EasyStock backend

pub mod auth;
pub mod calendar;
pub mod category;
pub mod dashboard;
pub mod listing;
pub mod movement;
pub mod product;
pub mod task;

pub use auth::AuthService;
pub use calendar::CalendarService;
pub use category::CategoryService;
pub use dashboard::DashboardService;
pub use listing::ListingService;
pub use movement::MovementService;
pub use product::ProductService;
pub use task::TaskService;

//! HTTP API handlers for cohort-ar

pub mod attendance;
pub mod health;
pub mod settings;

pub use attendance::attendance_routes;
pub use health::health_routes;
pub use settings::settings_routes;

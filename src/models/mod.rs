// Data models and request/response types

pub mod assignment;
pub mod coaching_request;
pub mod daily_log;
pub mod dashboard;
pub mod exercise;
pub mod health_metric;
pub mod meal;
pub mod pagination;
pub mod plan;
pub mod todo;
pub mod user;
pub mod validation;

pub use assignment::*;
pub use coaching_request::*;
pub use daily_log::*;
pub use dashboard::*;
pub use exercise::*;
pub use health_metric::*;
pub use meal::*;
pub use pagination::*;
pub use plan::*;
pub use todo::*;
pub use user::*;
pub use validation::*;

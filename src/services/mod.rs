// Business logic services

pub mod assignment_service;
pub mod coaching_request_service;
pub mod daily_log_service;
pub mod dashboard_service;
pub mod exercise_service;
pub mod health_metric_service;
pub mod meal_service;
pub mod plan_service;
pub mod profile_service;
pub mod progress;
pub mod todo_category_service;
pub mod todo_service;
pub mod user_service;

pub use assignment_service::AssignmentService;
pub use coaching_request_service::{CoachingRequestService, RequestParty};
pub use daily_log_service::DailyLogService;
pub use dashboard_service::DashboardService;
pub use exercise_service::ExerciseService;
pub use health_metric_service::HealthMetricService;
pub use meal_service::MealService;
pub use plan_service::PlanService;
pub use profile_service::ProfileService;
pub use todo_category_service::TodoCategoryService;
pub use todo_service::TodoService;
pub use user_service::UserService;

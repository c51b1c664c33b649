pub mod audit;
pub mod course;
pub mod dispatch;
pub mod enrollment;
pub mod reconcile;
pub mod shared;
pub mod user;

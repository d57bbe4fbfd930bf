pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod notify;
pub mod repository;
pub mod service;
pub mod state;
pub mod validation;
pub mod views;

pub use app::build_router;
pub use error::{AppError, AppResult};

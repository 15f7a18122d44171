pub mod dtos;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod validation;

pub use routes::routes;
pub use services::FileService;

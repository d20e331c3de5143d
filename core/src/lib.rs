pub mod db;
pub mod error;
pub mod gemini;
pub mod models;
pub mod service;
pub mod spoonacular;
pub mod vision;

pub use error::Error;

pub mod health;
pub mod inference;
pub mod lifecycle;
pub mod models;

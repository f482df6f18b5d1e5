pub mod admin;
pub mod health;
pub mod passthrough;
pub mod trending;
pub mod tv;

pub mod admin;
pub mod api;
pub mod auth;
pub mod health;
pub mod keys;
pub mod pages;
pub mod shoes;

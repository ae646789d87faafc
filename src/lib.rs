//! CourseHub - Course portal backend
//!
//! Students, assignments, weekly units, course resources and their comments
//! behind one session-authenticated JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

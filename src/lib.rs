pub mod action;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod guard;
pub mod input;
pub mod model;
pub mod summary;
pub mod ui;

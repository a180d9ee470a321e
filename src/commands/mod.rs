pub mod config;
pub mod exercise;
pub mod live;
pub mod report;
pub mod session;

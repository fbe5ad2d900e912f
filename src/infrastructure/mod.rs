pub mod activity_log;
pub mod config;
pub mod error;
pub mod shift_repository;
pub mod storage;

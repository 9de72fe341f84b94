pub mod api;
pub mod config;
pub mod gate;
pub mod humanize;
pub mod index;
pub mod observability;
pub mod recipe;
pub mod resolver;
pub mod storage;

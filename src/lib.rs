pub mod activity;
pub mod address;
pub mod aggregator;
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod counterparties;
pub mod debounce;
pub mod error;
pub mod executor;
pub mod history;
pub mod inspector;
pub mod models;
pub mod parser;
pub mod proxy;
pub mod queries;
pub mod units;
pub mod warehouse;

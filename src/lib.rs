pub mod auction;
pub mod bidding;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod lifecycle;
pub mod notifier;
pub mod store;

//! Sagoma Kernel Library
//!
//! Request directive shaping for collection endpoints: `include`, `sort`,
//! `filter` and `page` parameters become a validated [`directive::RequestOptions`]
//! applied to a data-access [`collection::CollectionHandle`].
//! The `sagoma` binary serves in-memory resources over this library.

pub mod collection;
pub mod config;
pub mod controller;
pub mod directive;
pub mod error;
pub mod loader;
pub mod memory;
pub mod policy;
pub mod query_builder;
pub mod record;
pub mod routes;
pub mod serialize;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

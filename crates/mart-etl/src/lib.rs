//! Extraction, staging and build orchestration for the sales mart.
//!
//! `stage` acquires the raw resources and replaces their staged relations.
//! `pipeline` rebuilds the five dimensions as concurrent units, then runs the
//! fact unit once all of them are terminal. Both are generic over
//! [`mart_core::store::WarehouseStore`].

#![allow(async_fn_in_trait)]

pub mod acquire;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod stage;
pub mod units;

pub use error::{Error, FetchError, Result};

//! Core types and transformation rules for the sales data mart.
//!
//! This crate has no HTTP or database dependencies. It owns
//! the resource catalog, the staging parser, the five dimension builders and
//! the key resolver that turns staged order rows into fact rows. Storage
//! backends implement [`store::WarehouseStore`]; the pipeline crate drives the
//! builders against that trait.

// Trait methods spell out `impl Future + Send`; implementors use `async fn`.
#![allow(async_fn_in_trait)]

pub mod dimension;
pub mod error;
pub mod fact;
pub mod resource;
pub mod staging;
pub mod store;

pub use error::{Error, Result};

//! # VerDB Testkit
//!
//! Example domain and test helpers for VerDB.
//!
//! The shop domain (a [`Shop`](shop::Shop) holding
//! [`ItemGroup`](shop::ItemGroup)s holding [`Item`](shop::Item)s) is the
//! reference exercise of the engine's public surface: a closed entity
//! enum, reference-slot maintenance, optimistic checks and history
//! walks. The domain operations are written the way a code generator
//! for entity types would emit them.
//!
//! The crate's `tests/` directory holds the cross-crate integration
//! suite built on these types.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod shop;

pub use shop::{Item, ItemGroup, Shop, ShopEntity};

//! Shared types and utilities for the gavel auction engine.
//!
//! This crate contains:
//! - Common types (PlayerRole, RoomStatus, AuctionRules, Player)
//! - Persistence records and the ClickHouse store wrapper
//! - Schema definitions

pub mod store;
pub mod types;

pub use store::{GavelStore, StoreConfig, StoreError};
pub use types::*;

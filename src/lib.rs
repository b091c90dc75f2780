//! Court rotation engine for a badminton club: roster and courts, court sessions with their
//! lifecycle, balanced automatic team assignment and a history of finished games.
//!
//! Hosts drive everything through [`state::AppState`]: commands go in, typed errors or
//! outcomes come out, and read-only views are rebuilt from the resulting state.

/// Runtime configuration.
pub mod config;
/// Persistence: entity models and stores.
pub mod dao;
/// Views and inputs exchanged with hosts.
pub mod dto;
/// Service error taxonomy.
pub mod error;
pub mod services;
pub mod state;

//! Customer loyalty points ledger.
//!
//! The [`Ledger`](commands::Ledger) credits and debits a per-customer points balance while
//! keeping running totals of points earned and spent. Storage and the audit trail are ports
//! ([`ports::store`], [`ports::audit`]) injected at construction; [`adapters`] holds in-memory
//! and `tracing` implementations.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

pub use commands::{Error, Ledger};
pub use config::LedgerConfig;
pub use domain::{AuditEntry, CustomerId, PointsRecord};

//! connui-cellular - cellular modem state for connectivity UIs.
//!
//! Aggregates the modems exposed by the oFono daemon into one observable
//! model that status indicators, settings dialogs and PIN prompts share:
//!
//! - Modem, SIM, network registration and packet data state per modem
//! - Observer registration with change coalescing
//! - Cancellable supplementary-service requests (call waiting, forwarding)
//! - Interactive PIN/PUK entry and PIN change sessions
//! - CLI for inspecting and driving modems
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use connui_cellular::{config::OfonoConfig, services::ofono::CellularContext};
//!
//! # async fn example() -> Result<(), connui_cellular::services::ofono::CellularError> {
//! let cellular = CellularContext::ofono(&OfonoConfig::default()).await?;
//! let subscription = cellular
//!     .register_net_observer(|path, net| println!("{path}: {} {}%", net.name, net.strength))
//!     .await?;
//!
//! // ...
//!
//! cellular.close(subscription).await?;
//! # Ok(())
//! # }
//! ```

/// Configuration schema definitions and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Command-line interface for modem inspection and control.
pub mod cli;

/// Cellular services built on the modem daemon.
pub mod services;

/// Logging setup for the binary.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{ConnuiError, Result};

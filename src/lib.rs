//! # aurad
//!
//! A Linux daemon for controlling the RGB lighting chip of NVIDIA graphics
//! cards over the card's I2C bus.
//!
//! ## Features
//!
//! - **Bus Discovery**: Finds the "NVIDIA i2c adapter 1" bus through sysfs
//! - **Register Access**: SMBus byte transfers on `/dev/i2c-<N>`
//! - **Color & Mode Control**: 24-bit color and four built-in effects
//! - **D-Bus Interface**: One serialized entry point for every local client
//!
//! ## Architecture
//!
//! - [`BusLocator`](bus::BusLocator) - resolves the adapter number per call
//! - [`RegisterChannel`](bus::RegisterChannel) - scoped sessions on the chip
//! - [`LightingController`](lighting::LightingController) - color and mode API
//! - [`ControlService`](service::ControlService) - gate serializing callers
//! - [`SystemCoordinator`](coordinator::SystemCoordinator) - daemon lifecycle
//!
//! ## Example
//!
//! ```no_run
//! use aurad::{application::Application, config::ConfigManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config_manager = ConfigManager::load(None)?;
//!     Application::builder()
//!         .with_config_manager(config_manager)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod application;
pub mod bus;
pub mod cli;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod interface;
pub mod lighting;
pub mod providers;
pub mod service;
pub mod task_manager;

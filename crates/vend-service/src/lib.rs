//! # vend-service: Session Orchestration
//!
//! Runs many customers against one vending machine.
//!
//! ## Modules
//!
//! - [`service`] - `VendingService`: insert, select, complete, cancel
//! - [`session`] - One transaction per session, one lock per transaction
//! - [`repository`] - Product persistence port and in-memory adapter
//! - [`config`] - `MachineConfig` from TOML and environment
//! - [`error`] - Service errors and machine-readable codes
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vend_core::Money;
//! use vend_service::{InMemoryProductRepository, MachineConfig, VendingService};
//!
//! # async fn run() -> vend_service::ServiceResult<()> {
//! let config = MachineConfig::load_or_default(None);
//! let service = VendingService::bootstrap(&config, Arc::new(InMemoryProductRepository::new())).await?;
//!
//! let water = service.list_products().await?.remove(0);
//! let session = service.open_session();
//! service.insert_money(session, Money::new(10.0)?).await?;
//! service.select_product(session, water.id()).await?;
//!
//! let order = service.complete_order(session).await?;
//! println!("change: {}", order.returned_total());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod repository;
pub mod service;
pub mod session;

pub use config::MachineConfig;
pub use error::{ConfigError, ErrorCode, RepositoryError, ServiceError, ServiceResult};
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::{Order, VendingService};
pub use session::SessionId;

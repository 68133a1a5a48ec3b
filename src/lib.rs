//! ODT control: maintenance work-order lifecycle core.
//!
//! The crate tracks machines, raises maintenance work orders (ODTs) when a
//! machine needs attention, and drives each order through a gated approval
//! workflow.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: In-memory and `PostgreSQL` implementations of ports
//! - **Services**: Use-case orchestration over ports
//!
//! # Modules
//!
//! - [`access`]: Actors, roles and capability checks
//! - [`machinery`]: Machine registry and state-change notification
//! - [`work_order`]: Work-order numbering, workflow and queries
//! - [`config`]: Layered settings
//! - [`database`]: `PostgreSQL` connection pool
//! - [`telemetry`]: Logging setup

pub mod access;
pub mod config;
pub mod database;
pub mod machinery;
pub mod telemetry;
pub mod work_order;

//! Stormwatch - a dashboard service for browsing active weather-hazard
//! alerts.
//!
//! # Overview
//!
//! Stormwatch pulls hazard alerts from the National Weather Service public
//! API, lets a user narrow them by area, zone, severity, and urgency, orders
//! them, and serves the result as a paginated table view. The pipeline is
//! fetch → filter → sort → paginate, driven by a session that owns the
//! user's selection and keeps the displayed list a pure projection of it.
//!
//! Nothing persists: alert collections live in a per-key fetch cache for
//! the lifetime of the session, and the session itself is created with
//! defaults at startup.
//!
//! # Modules
//!
//! - [`model`]: wire types for alert and zone collections
//! - [`data_sources`]: the NWS API client and the feed abstraction
//! - [`cache`]: keyed, de-duplicating fetch bookkeeping
//! - [`derive`]: the pure filter + sort pipeline
//! - [`session`]: selection state, fetch orchestration, pagination
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod cache;
pub mod data_sources;
pub mod derive;
pub mod model;
pub mod session;

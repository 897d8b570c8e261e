//! Client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), keeps the client-side list
//! state, and drives both through [`TodoApp`] over a frontend-supplied
//! [`Transport`].
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `TodoState` is pure: filtering is a projection and never causes I/O.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod app;
pub mod client;
pub mod error;
pub mod http;
pub mod state;
pub mod types;

pub use app::{TodoApp, MAX_PARALLEL_DELETES};
pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use state::{Filter, TodoState};
pub use types::{CreateItem, Health, Item, ReorderAck, ReorderItems, UpdateItem};

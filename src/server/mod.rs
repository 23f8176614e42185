//! HTTP edge for imgtier.
//!
//! This module is the host surface in front of the mediator: it terminates
//! HTTP, maps request headers onto the interception boundary, and relays
//! mediated (or passed-through) responses.
//!
//! ```text
//! GET /img?url=...  ──▶  handlers  ──▶  Mediator  ──▶  StepdownResolver
//!        Referer/ECT/Downlink headers        │
//!                                            └──▶ pass-through fetch
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, img_handler, AppState, ErrorResponse, HealthResponse, ImgQueryParams,
    SERVED_FROM_HEADER,
};
pub use routes::{create_router, RouterConfig};

//! MotorID API - HTTP Gateway
//!
//! Request-facing layer of the registry: validates and authorizes inbound
//! calls, serves person lookups straight from the snapshot cache, and
//! forwards mutations over the command channel to the worker, blocking each
//! call on its correlated response.

pub mod config;
pub mod error;
pub mod macros;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod types;
pub mod validation;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{AppState, SharedCache};
pub use types::{RefreshRequest, SetVerifiedRequest};

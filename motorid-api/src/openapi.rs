//! OpenAPI document for the MotorID API.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{HealthResponse, HealthStatus};
use crate::types::{RefreshRequest, SetVerifiedRequest};
use motorid_core::{Person, PersonDraft, PersonSummary, ViewUpdate};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MotorID API",
        description = "Person identity registry for vehicle/driver records",
        license(name = "MIT")
    ),
    paths(
        crate::routes::person::create_person,
        crate::routes::person::get_person,
        crate::routes::person::update_views,
        crate::routes::person::set_verified,
        crate::routes::person::refresh,
    ),
    components(schemas(
        Person,
        PersonDraft,
        PersonSummary,
        ViewUpdate,
        SetVerifiedRequest,
        RefreshRequest,
        ApiError,
        ErrorCode,
        HealthResponse,
        HealthStatus,
    )),
    tags(
        (name = "Persons", description = "Person record lifecycle and cache operations")
    )
)]
pub struct ApiDoc;

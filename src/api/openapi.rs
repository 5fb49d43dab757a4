//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the image-dl REST API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the image-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "image-dl REST API",
        version = "0.2.0",
        description = "REST API for submitting image URLs, retrieving them in the background, and polling retrieval status",
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Images
        crate::api::routes::submit_image,
        crate::api::routes::get_image,
        crate::api::routes::list_images,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::api::routes::SubmitImageRequest,
        crate::api::routes::SubmitImageResponse,
        crate::projection::StatusProjection,
        crate::projection::ListingEntry,
        crate::types::ImageId,
        crate::types::ImageStatus,
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::config::Config,
        crate::config::FetchConfig,
        crate::config::StorageConfig,
        crate::config::PersistenceConfig,
        crate::config::ApiConfig,
    )),
    tags(
        (name = "images", description = "Image submission and retrieval status"),
        (name = "system", description = "Health and API metadata")
    )
)]
pub struct ApiDoc;

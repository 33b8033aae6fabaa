//! OpenAPI document assembly.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register,
        handlers::auth::confirm,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::files::upload_file,
        handlers::files::list_files,
        handlers::files::search_files,
        handlers::files::get_file,
        handlers::files::download_file,
        handlers::files::preview_file,
        handlers::files::delete_file,
        handlers::objects::serve_object,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::health::HealthResponse,
        crate::handlers::auth::RegisterRequest,
        crate::handlers::auth::ConfirmRequest,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::TokenResponse,
        crate::handlers::auth::MessageResponse,
        crate::services::DownloadLink,
        crate::services::PreviewLink,
        filevault_core::models::FileKind,
        filevault_core::models::FileRecordResponse,
        filevault_core::models::UserResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Account registration and sessions"),
        (name = "files", description = "Per-user file storage"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "FileVault API",
        description = "Multi-tenant file storage: authenticated upload, listing, search, signed download and preview URLs."
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wanderlust Service API",
        version = "1.0.0",
        description = "Listings marketplace API: stays, reviews, search and category filters.\n\n**Authentication:** creating, editing and reviewing listings requires a JWT Bearer token from `/signup` or `/login`.\n\n**Flash responses:** empty searches and filters answer `303 See Other` with `{success: false, error, redirect}`."
    ),
    paths(
        // Listings
        crate::api::listings::index,
        crate::api::listings::new_form,
        crate::api::listings::create,
        crate::api::listings::search,
        crate::api::listings::filter,
        crate::api::listings::show,
        crate::api::listings::edit,
        crate::api::listings::update,
        crate::api::listings::delete,
        crate::api::listings::reserve,

        // Reviews
        crate::api::reviews::create,
        crate::api::reviews::delete,

        // Auth
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::logout,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Listings
            crate::models::Image,
            crate::models::Geometry,
            crate::models::GeometryKind,
            crate::models::ImageUpload,
            crate::models::ListingInput,
            crate::models::ListingPayload,
            crate::models::ListingResponse,
            crate::models::ListingDetails,
            crate::api::listings::ListingsResponse,
            crate::api::listings::ListingEnvelope,
            crate::api::listings::ListingDetailsResponse,
            crate::api::listings::EditListingResponse,
            crate::api::listings::NewListingForm,

            // Reviews
            crate::models::ReviewInput,
            crate::models::ReviewPayload,
            crate::models::ReviewResponse,
            crate::api::reviews::ReviewEnvelope,

            // Auth
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Listings", description = "Browse, search, filter and manage listings. Writes are limited to the listing owner."),
        (name = "Reviews", description = "Reviews attached to a listing. Only the author may delete a review."),
        (name = "Auth", description = "Signup, login and logout with JWT bearer tokens."),
        (name = "Health", description = "Health check and Prometheus metrics."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /signup or /login"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_listing_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/listings", "/listings/search", "/listings/{id}", "/listings/{id}/reviews"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}

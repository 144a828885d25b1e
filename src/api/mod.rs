pub mod auth;
pub mod health;
pub mod listings;
pub mod metrics;
pub mod reviews;
pub mod swagger;

use actix_web::{web, HttpResponse};

use crate::middleware::RequireAuth;
use crate::utils::AppError;

/// Uploads travel base64 encoded inside the JSON body.
const JSON_LIMIT: usize = 50 * 1024 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| AppError::InvalidRequest(format!("Invalid JSON body: {}", err)).into())
}

/// Route table shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(listings::root))
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(metrics::get_metrics))
        .route("/uploads/{filename}", web::get().to(listings::upload))
        // Auth
        .service(
            web::resource("/signup")
                .route(web::get().to(auth::signup_form))
                .route(web::post().to(auth::signup)),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        )
        .route("/logout", web::get().to(auth::logout))
        // Listings; fixed segments before `/{id}`
        .service(
            web::scope("/listings")
                .service(
                    web::resource("")
                        .route(web::get().to(listings::index))
                        .route(web::post().to(listings::create).wrap(RequireAuth)),
                )
                .route("/new", web::get().to(listings::new_form).wrap(RequireAuth))
                .route("/search", web::get().to(listings::search))
                .route("/filter/{category}", web::get().to(listings::filter))
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(listings::show))
                        .route(web::put().to(listings::update).wrap(RequireAuth))
                        .route(web::delete().to(listings::delete).wrap(RequireAuth)),
                )
                .route("/{id}/edit", web::get().to(listings::edit).wrap(RequireAuth))
                .route("/{id}/reserve", web::post().to(listings::reserve).wrap(RequireAuth))
                .route("/{id}/reviews", web::post().to(reviews::create).wrap(RequireAuth))
                .route(
                    "/{id}/reviews/{review_id}",
                    web::delete().to(reviews::delete).wrap(RequireAuth),
                ),
        );
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "success": false,
        "error": "Page not found!"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLACEHOLDER_IMAGE_URL;
    use crate::testing::{signed_up, test_state, StubGeocoder};
    use actix_web::{
        http::{header, StatusCode},
        test, App,
    };
    use mongodb::bson::oid::ObjectId;
    use serde_json::{json, Value};

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure)
                    .default_service(web::to(not_found)),
            )
            .await
        };
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    fn listing_body(title: &str) -> Value {
        json!({
            "listing": {
                "title": title,
                "description": "Step back in time in this historic villa.",
                "location": "Florence",
                "country": "Italy",
                "price": 2500,
                "category": "Castles"
            }
        })
    }

    macro_rules! create_listing {
        ($app:expr, $token:expr, $title:expr) => {{
            let req = test::TestRequest::post()
                .uri("/listings")
                .insert_header(bearer($token))
                .set_json(listing_body($title))
                .to_request();
            let resp = test::call_service($app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body: Value = test::read_body_json(resp).await;
            body["listing"]["id"].as_str().unwrap().to_string()
        }};
    }

    #[actix_web::test]
    async fn root_redirects_to_listings() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let app = app!(state);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/listings");
    }

    #[actix_web::test]
    async fn create_requires_login() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/listings")
            .set_json(listing_body("Villa"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "You must be logged in!");
        assert_eq!(body["redirect"], "/login");
    }

    #[actix_web::test]
    async fn created_listing_uses_placeholder_and_shows_owner() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, token) = signed_up(&state, "host").await;
        let app = app!(state);

        let id = create_listing!(&app, &token, "Historic Villa");

        let req = test::TestRequest::get().uri(&format!("/listings/{}", id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["listing"]["image"]["url"], PLACEHOLDER_IMAGE_URL);
        assert_eq!(body["listing"]["owner_info"]["username"], "host");
        assert_eq!(body["listing"]["geometry"]["coordinates"], json!([0.0, 0.0]));
    }

    #[actix_web::test]
    async fn invalid_listing_lists_every_violation() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, token) = signed_up(&state, "host").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/listings")
            .insert_header(bearer(&token))
            .set_json(json!({ "listing": { "title": "Villa", "price": "abc" } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("\"listing.description\" is required"));
        assert!(error.contains("\"listing.price\" must be a number"));
    }

    #[actix_web::test]
    async fn other_users_cannot_modify_listing() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, owner_token) = signed_up(&state, "owner").await;
        let (_, other_token) = signed_up(&state, "guest").await;
        let app = app!(state);

        let id = create_listing!(&app, &owner_token, "Villa");

        let req = test::TestRequest::put()
            .uri(&format!("/listings/{}", id))
            .insert_header(bearer(&other_token))
            .set_json(json!({ "listing": { "title": "Taken" } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/listings/{}", id))
            .insert_header(bearer(&other_token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "You are not the owner of this listing");

        let req = test::TestRequest::get()
            .uri(&format!("/listings/{}/edit", id))
            .insert_header(bearer(&owner_token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["original_image_url"], PLACEHOLDER_IMAGE_URL);
    }

    #[actix_web::test]
    async fn deleting_listing_deletes_its_reviews() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, owner_token) = signed_up(&state, "owner").await;
        let (_, guest_token) = signed_up(&state, "guest").await;
        let listings = state.listings.clone();
        let app = app!(state);

        let id = create_listing!(&app, &owner_token, "Villa");

        let req = test::TestRequest::post()
            .uri(&format!("/listings/{}/reviews", id))
            .insert_header(bearer(&guest_token))
            .set_json(json!({ "review": { "rating": 5, "comment": "Wonderful" } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "New Review created!");
        assert_eq!(body["review"]["author"]["username"], "guest");
        let review_id = ObjectId::parse_str(body["review"]["id"].as_str().unwrap()).unwrap();

        let req = test::TestRequest::delete()
            .uri(&format!("/listings/{}", id))
            .insert_header(bearer(&owner_token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert!(listings.get_review(&review_id).await.unwrap().is_none());

        let req = test::TestRequest::get().uri(&format!("/listings/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn review_delete_is_author_only() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, owner_token) = signed_up(&state, "owner").await;
        let (_, guest_token) = signed_up(&state, "guest").await;
        let app = app!(state);

        let id = create_listing!(&app, &owner_token, "Villa");
        let req = test::TestRequest::post()
            .uri(&format!("/listings/{}/reviews", id))
            .insert_header(bearer(&guest_token))
            .set_json(json!({ "review": { "rating": 4, "comment": "Nice" } }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let review_id = body["review"]["id"].as_str().unwrap().to_string();
        let uri = format!("/listings/{}/reviews/{}", id, review_id);

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&owner_token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&guest_token)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Review deleted!");

        let req = test::TestRequest::get().uri(&format!("/listings/{}", id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["listing"]["reviews"], json!([]));
    }

    #[actix_web::test]
    async fn empty_search_and_filter_redirect_back() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, token) = signed_up(&state, "host").await;
        let app = app!(state);
        create_listing!(&app, &token, "Historic Villa");

        let req = test::TestRequest::get().uri("/listings/search?q=%20%20").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/listings");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Please enter search query!");

        let req = test::TestRequest::get().uri("/listings/filter/arctic").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["error"], "There are no listings for arctic!");

        let req = test::TestRequest::get().uri("/listings/filter/castles").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Listings Filtered by castles!");
        assert_eq!(body["count"], 1);

        let req = test::TestRequest::get().uri("/listings/search?q=villa").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Listings searched by Title!");
    }

    #[actix_web::test]
    async fn logout_revokes_token() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, token) = signed_up(&state, "host").await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/logout").insert_header(bearer(&token)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "you are logged out");

        let req = test::TestRequest::get().uri("/listings/new").insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_returns_token() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        signed_up(&state, "host").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "username": "host", "password": "password" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Welcome back to Wanderlust!");
        let token = body["token"].as_str().unwrap();

        let req = test::TestRequest::get().uri("/listings/new").insert_header(bearer(token)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["categories"].as_array().unwrap().len(), 10);
    }

    #[actix_web::test]
    async fn unknown_routes_and_bad_json() {
        let (state, _) = test_state(StubGeocoder::unavailable());
        let (_, token) = signed_up(&state, "host").await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Page not found!");

        let req = test::TestRequest::post()
            .uri("/listings")
            .insert_header(bearer(&token))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{ not json")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}

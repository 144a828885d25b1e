use actix_web::{http::header, web, HttpRequest, HttpResponse, ResponseError};

use crate::services::auth_service::{self, AuthResponse, LoginRequest, SignupRequest};
use crate::state::AppState;

pub async fn signup_form() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "fields": ["username", "email", "password"],
        "action": "/signup"
    }))
}

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered and logged in", body = AuthResponse),
        (status = 400, description = "Missing field"),
        (status = 409, description = "Username already registered")
    )
)]
pub async fn signup(
    state: web::Data<AppState>,
    request: web::Json<SignupRequest>,
) -> HttpResponse {
    let username = request.username.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /signup - username: {}", username);

    match auth_service::signup(&state.auth, state.users.as_ref(), &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", username);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", username, e);
            e.error_response()
        }
    }
}

pub async fn login_form() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "fields": ["username", "password"],
        "action": "/login"
    }))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /login - username: {}", request.username);

    match auth_service::login(&state.auth, state.users.as_ref(), &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.username);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.username, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out; a presented token is revoked")
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    // Logging out without a (valid) token is still a successful logout
    if let Some(token) = auth_service::bearer_token(header_value) {
        match auth_service::authenticate(&state.auth, state.users.as_ref(), token).await {
            Ok(claims) => {
                if let Err(e) = auth_service::logout(state.users.as_ref(), &claims).await {
                    return e.error_response();
                }
            }
            Err(e) => log::debug!("Logout with unusable token: {}", e),
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "you are logged out",
        "redirect": "/listings"
    }))
}

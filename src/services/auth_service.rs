use crate::{
    database::UserRepository,
    models::{RevokedToken, User, UserInfo},
    utils::AppError,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const INVALID_CREDENTIALS: &str = "Password or username is incorrect";
pub const LOGIN_REQUIRED: &str = "You must be logged in!";

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (hex)
    pub username: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))
    }
}

/// Token signing and password hashing parameters.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            // Same lifetime as the original one-week session cookie
            token_ttl: Duration::days(7),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let user_id = user
            .id
            .ok_or_else(|| AppError::Internal("Cannot issue a token for an unsaved user".into()))?;
        let now = Utc::now();

        let claims = Claims {
            sub: user_id.to_hex(),
            username: user.username.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.token_ttl).timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Signature, issuer, audience and expiry; revocation is checked by the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("Invalid token: {}", e);
            AppError::Unauthorized(LOGIN_REQUIRED.to_string())
        })
    }
}

/// `Authorization: Bearer <token>` value, if present.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the token and makes sure it was not logged out.
pub async fn authenticate(
    settings: &AuthSettings,
    users: &dyn UserRepository,
    token: &str,
) -> Result<Claims, AppError> {
    let claims = settings.verify(token)?;
    if users.is_token_revoked(&claims.jti).await? {
        return Err(AppError::Unauthorized(LOGIN_REQUIRED.to_string()));
    }
    Ok(claims)
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserInfo,
    pub redirect: String,
}

fn required(field: &str, value: &Option<String>) -> Result<String, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidRequest(format!("No {} was given", field)))
}

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

async fn password_matches(password: String, password_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))
}

// User registration (logs the new user in)
pub async fn signup(
    settings: &AuthSettings,
    users: &dyn UserRepository,
    request: &SignupRequest,
) -> Result<AuthResponse, AppError> {
    let username = required("username", &request.username)?;
    let email = required("email", &request.email)?;
    let password = request
        .password
        .clone()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("No password was given".to_string()))?;

    let password_hash = hash_password(password, settings.bcrypt_cost).await?;

    let user = users
        .insert_user(User {
            id: None,
            username,
            email,
            password_hash,
            created_at: Utc::now().timestamp(),
        })
        .await?;

    let token = settings.issue(&user)?;
    log::info!("✅ User registered successfully: {}", user.username);

    Ok(AuthResponse {
        success: true,
        message: "Welcome to Wanderlust!".to_string(),
        token,
        user: UserInfo::from(&user),
        redirect: "/listings".to_string(),
    })
}

// User login
pub async fn login(
    settings: &AuthSettings,
    users: &dyn UserRepository,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let user = users
        .find_user_by_username(request.username.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password_matches(request.password.clone(), user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = settings.issue(&user)?;

    Ok(AuthResponse {
        success: true,
        message: "Welcome back to Wanderlust!".to_string(),
        token,
        user: UserInfo::from(&user),
        redirect: "/listings".to_string(),
    })
}

/// Revokes the presented token until it would have expired anyway.
pub async fn logout(users: &dyn UserRepository, claims: &Claims) -> Result<(), AppError> {
    let expires_at = BsonDateTime::from_millis((claims.exp as i64).saturating_mul(1000));
    users
        .revoke_token(RevokedToken {
            jti: claims.jti.clone(),
            expires_at,
        })
        .await?;
    log::info!("👋 User logged out: {}", claims.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn settings() -> AuthSettings {
        AuthSettings {
            bcrypt_cost: 4,
            ..AuthSettings::new("test-secret", "wanderlust-service", "wanderlust-web")
        }
    }

    fn signup_request(username: &str) -> SignupRequest {
        SignupRequest {
            username: Some(username.into()),
            email: Some(format!("{}@example.com", username)),
            password: Some("hunter2".into()),
        }
    }

    #[tokio::test]
    async fn signup_then_login() {
        let store = MemoryStore::new();
        let settings = settings();

        let registered = signup(&settings, &store, &signup_request("ana")).await.unwrap();
        assert_eq!(registered.user.username, "ana");
        let claims = settings.verify(&registered.token).unwrap();
        assert_eq!(claims.sub, registered.user.id);

        let logged_in = login(
            &settings,
            &store,
            &LoginRequest { username: "ana".into(), password: "hunter2".into() },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.message, "Welcome back to Wanderlust!");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let store = MemoryStore::new();
        let settings = settings();
        signup(&settings, &store, &signup_request("ana")).await.unwrap();

        let err = login(
            &settings,
            &store,
            &LoginRequest { username: "ana".into(), password: "wrong".into() },
        )
        .await
        .unwrap_err();
        assert_eq!(err, AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let store = MemoryStore::new();
        let settings = settings();
        signup(&settings, &store, &signup_request("ana")).await.unwrap();
        let err = signup(&settings, &store, &signup_request("ana")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn logged_out_token_no_longer_authenticates() {
        let store = MemoryStore::new();
        let settings = settings();
        let registered = signup(&settings, &store, &signup_request("ana")).await.unwrap();

        let claims = authenticate(&settings, &store, &registered.token).await.unwrap();
        logout(&store, &claims).await.unwrap();

        let err = authenticate(&settings, &store, &registered.token).await.unwrap_err();
        assert_eq!(err, AppError::Unauthorized(LOGIN_REQUIRED.into()));
    }

    #[test]
    fn token_from_another_issuer_is_rejected() {
        let user = User {
            id: Some(ObjectId::new()),
            username: "ana".into(),
            email: "ana@example.com".into(),
            password_hash: String::new(),
            created_at: 0,
        };
        let foreign = AuthSettings::new("test-secret", "someone-else", "wanderlust-web");
        let token = foreign.issue(&user).unwrap();
        assert!(settings().verify(&token).is_err());
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer   ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[tokio::test]
    async fn missing_signup_fields_are_reported() {
        let store = MemoryStore::new();
        let err = signup(
            &settings(),
            &store,
            &SignupRequest { username: Some("ana".into()), email: None, password: Some("x".into()) },
        )
        .await
        .unwrap_err();
        assert_eq!(err, AppError::InvalidRequest("No email was given".into()));
    }
}

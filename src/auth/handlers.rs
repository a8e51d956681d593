use crate::{
    auth::{
        email_index::EmailIndex,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::ApiError,
    model::user::User,
    models::{LoginReqDto, LoginResponse, RegisterReq},
    validation::is_valid_email,
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Ok(true)  => email AVAILABLE
/// Ok(false) => email TAKEN
pub async fn is_email_available(
    email: &str,
    index: &EmailIndex,
    pool: &MySqlPool,
) -> Result<bool, ApiError> {
    // 1️⃣ Cuckoo filter — fast negative
    if !index.might_exist(email) {
        return Ok(true);
    }

    // 2️⃣ Moka cache — fast positive
    if index.is_known_taken(email) {
        return Ok(false);
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(email.trim().to_lowercase())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Database error while checking email availability");
        ApiError::Storage("Failed to register user".into())
    })?;

    Ok(!exists)
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = Object, example = json!({
            "success": true, "message": "User registered successfully"
        })),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(user, pool, index), fields(email = %user.email))]
pub async fn register(
    user: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
    index: web::Data<EmailIndex>,
) -> Result<HttpResponse, ApiError> {
    let name = user.name.trim();
    let email = user.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || user.password.is_empty() {
        return Err(ApiError::rejected("Name, email and password are required"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::rejected("Email is invalid"));
    }

    if !is_email_available(&email, &index, pool.get_ref()).await? {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hashed = hash_password(&user.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Storage("Failed to register user".into())
    })?;

    let result = sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
        .bind(name)
        .bind(&email)
        .bind(hashed)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {
            index.mark_taken(&email).await;
            info!("User registered");
            Ok(HttpResponse::Created().json(json!({
                "success": true,
                "message": "User registered successfully"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    index.mark_taken(&email).await;
                    return Err(ApiError::Conflict("Email already registered".into()));
                }
            }
            error!(error = %e, "Failed to insert user");
            Err(ApiError::Storage("Failed to register user".into()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, user), fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.email.trim().is_empty() || user.password.is_empty() {
        return Err(ApiError::rejected("Email and password are required"));
    }

    // 2️⃣ Fetch user
    let db_user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, created_at FROM users WHERE email = ?",
    )
    .bind(user.email.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Database error while fetching user");
        ApiError::Storage("Server error while logging in".into())
    })?
    .ok_or_else(|| {
        info!("Invalid credentials: user not found");
        ApiError::Unauthorized("Invalid credentials".into())
    })?;

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    // 4️⃣ Generate access token
    debug!(user_id = db_user.id, "Generating access token");
    let token = generate_access_token(
        db_user.id,
        db_user.email.clone(),
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        ApiError::Storage("Server error while logging in".into())
    })?;

    // 5️⃣ Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW(6) WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        success: true,
        token,
        user: db_user,
    }))
}

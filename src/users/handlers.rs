use axum::{
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{is_unique_violation, ApiError},
    respond::{success, success_message, Envelope},
    state::AppState,
};

use super::{
    dto::{ActivateRequest, LoginData, LoginRequest, ProfileData, RegisterResponse},
    jwt::{AuthUser, JwtKeys},
    password::{hash_password, verify_password},
    repo::{NewUser, ProfileUpdate, User},
};

/// Fields accepted from the register / update-profile multipart forms.
/// Everything is optional at the parse level; presence rules are enforced
/// per endpoint.
#[derive(Default)]
struct UserForm {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    address: Option<String>,
    file: Option<(Bytes, String)>,
}

async fn collect_user_form(mut mp: Multipart) -> Result<UserForm, ApiError> {
    let mut form = UserForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                form.file = Some((data, content_type));
            }
            Some(other) => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                match other {
                    "first_name" => form.first_name = Some(value),
                    "last_name" => form.last_name = Some(value),
                    "email" => form.email = Some(value),
                    "password" => form.password = Some(value),
                    "address" => form.address = Some(value),
                    _ => {}
                }
            }
            None => {}
        }
    }
    Ok(form)
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{name} is required")))
}

/// One-time code proving control of the registered email, drawn uniformly
/// from the six-digit range.
fn generate_activation_code() -> i32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

async fn store_avatar(
    state: &AppState,
    user_id: Uuid,
    body: Bytes,
    content_type: &str,
) -> Result<String, ApiError> {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("avatars/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    state.storage.put_object(&key, body, content_type).await?;
    Ok(key)
}

async fn presign_avatar(state: &AppState, key: Option<&str>) -> Option<String> {
    const TTL_SECS: u64 = 30 * 60;
    let key = key?;
    match state.storage.presign_get(key, TTL_SECS).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %e, key, "presign avatar failed");
            None
        }
    }
}

/// Inserts the registration row. The avatar is uploaded before the insert,
/// so when the insert fails the object must not be left orphaned in
/// storage. The pre-check in `register` races with concurrent
/// registrations; the unique constraint is the authority.
async fn insert_user_or_discard_avatar(
    state: &AppState,
    new: NewUser<'_>,
) -> Result<User, ApiError> {
    let image_key = new.image.map(|k| k.to_string());
    let email = new.email.to_string();
    match User::create(&state.db, new).await {
        Ok(user) => Ok(user),
        Err(e) => {
            if let Some(key) = image_key {
                if let Err(del) = state.storage.delete_object(&key).await {
                    warn!(error = %del, key = %key, "discard avatar after failed insert");
                }
            }
            if is_unique_violation(&e) {
                warn!(email = %email, "email already registered");
                Err(ApiError::DuplicateEmail)
            } else {
                Err(e.into())
            }
        }
    }
}

#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let form = collect_user_form(mp).await?;

    let first_name = required(form.first_name, "first_name")?;
    let last_name = required(form.last_name, "last_name")?;
    let email = required(form.email, "email")?.trim().to_lowercase();
    let password = required(form.password, "password")?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(&password)?;
    let code = generate_activation_code();
    let user_id = Uuid::new_v4();

    let image = match form.file {
        Some((bytes, content_type)) => {
            Some(store_avatar(&state, user_id, bytes, &content_type).await?)
        }
        None => None,
    };

    let user = insert_user_or_discard_avatar(
        &state,
        NewUser {
            id: user_id,
            first_name: &first_name,
            last_name: &last_name,
            email: &email,
            password_hash: &password_hash,
            address: form.address.as_deref(),
            image: image.as_deref(),
            activation_code: code,
        },
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            status: "Success",
            message: "User Registered".into(),
            code,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn activate(
    State(state): State<AppState>,
    Json(payload): Json<ActivateRequest>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    match User::activate(&state.db, &email, payload.code).await? {
        Some(user_id) => {
            info!(user_id = %user_id, "account activated");
            Ok(success_message("Account activated"))
        }
        None => {
            warn!(email = %email, "activation code mismatch");
            Err(ApiError::ActivationMismatch)
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<Envelope<LoginData>>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password are indistinguishable to the caller.
    // An unverified account may still log in; activation only flips a flag.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(success(
        "Successfully logged in",
        LoginData { user, token },
    ))
}

#[instrument(skip(state, mp))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mp: Multipart,
) -> Result<Json<Envelope<ProfileData>>, ApiError> {
    let form = collect_user_form(mp).await?;

    let mut update = ProfileUpdate {
        first_name: form.first_name,
        last_name: form.last_name,
        address: form.address,
        password_hash: None,
        image: None,
    };
    if let Some(password) = form.password {
        update.password_hash = Some(hash_password(&password)?);
    }

    // When a new image comes in, remember the old key so the replaced
    // object can be cleaned up after the row update lands.
    let previous_image = if form.file.is_some() {
        User::find_by_id(&state.db, claims.sub)
            .await?
            .and_then(|u| u.image)
    } else {
        None
    };
    if let Some((bytes, content_type)) = form.file {
        update.image = Some(store_avatar(&state, claims.sub, bytes, &content_type).await?);
    }

    let user = User::update_profile(&state.db, claims.sub, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if let Some(old_key) = previous_image {
        if user.image.as_deref() != Some(old_key.as_str()) {
            if let Err(e) = state.storage.delete_object(&old_key).await {
                warn!(error = %e, key = %old_key, "delete replaced avatar failed");
            }
        }
    }

    info!(user_id = %user.id, "profile updated");
    let image_url = presign_avatar(&state, user.image.as_deref()).await;
    Ok(success(
        "Profile update successful",
        ProfileData { user, image_url },
    ))
}

#[instrument(skip(state))]
pub async fn my_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Envelope<ProfileData>>, ApiError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let image_url = presign_avatar(&state, user.image.as_deref()).await;
    Ok(success("Found profile", ProfileData { user, image_url }))
}

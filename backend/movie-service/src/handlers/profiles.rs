/// Profile handlers - multipart profile creation and lookup
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{AvatarUpload, Gender, NewProfile};
use crate::services::ProfileService;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use futures::StreamExt;

const MAX_AVATAR_BYTES: usize = 1024 * 1024;
const MAX_TEXT_FIELD_BYTES: usize = 4096;
const AVATAR_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Drain a multipart form into profile fields plus an optional avatar
async fn read_profile_form(mut payload: Multipart) -> Result<(NewProfile, Option<AvatarUpload>)> {
    let mut profile = NewProfile::default();
    let mut avatar: Option<AvatarUpload> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();
        let limit = if name == "avatar" {
            MAX_AVATAR_BYTES
        } else {
            MAX_TEXT_FIELD_BYTES
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::validation(
                    &name,
                    format!("{} exceeds the maximum size of {} bytes", name, limit),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if name == "avatar" {
            if bytes.is_empty() {
                continue;
            }
            let content_type = field
                .content_type()
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_default();
            if !AVATAR_CONTENT_TYPES.contains(&content_type.as_str()) {
                return Err(AppError::validation(
                    "avatar",
                    "avatar must be a JPEG, PNG or WEBP image",
                ));
            }
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or("avatar")
                .to_string();
            avatar = Some(AvatarUpload {
                filename,
                content_type,
                bytes,
            });
            continue;
        }

        let text = String::from_utf8(bytes)
            .map_err(|_| AppError::validation(&name, format!("{} must be valid UTF-8", name)))?;
        match name.as_str() {
            "first_name" => profile.first_name = non_empty(text),
            "last_name" => profile.last_name = non_empty(text),
            "info" => profile.info = non_empty(text),
            "gender" => {
                profile.gender = match non_empty(text) {
                    Some(value) => Some(Gender::parse(&value).ok_or_else(|| {
                        AppError::validation("gender", "gender must be 'man' or 'woman'")
                    })?),
                    None => None,
                }
            }
            "date_of_birth" => {
                profile.date_of_birth = match non_empty(text) {
                    Some(value) => Some(NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(
                        |_| AppError::validation("date_of_birth", "date_of_birth must be YYYY-MM-DD"),
                    )?),
                    None => None,
                }
            }
            _ => {}
        }
    }

    Ok((profile, avatar))
}

pub async fn create_profile(
    service: web::Data<ProfileService>,
    user: AuthUser,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let (fields, avatar) = read_profile_form(payload).await?;
    let profile = service.create(&user, user_id, fields, avatar).await?;
    Ok(HttpResponse::Created().json(profile))
}

pub async fn get_profile(
    service: web::Data<ProfileService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let profile = service.get(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// User profiles with avatar upload to object storage
use crate::db::{profile_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::{check_owner_or_staff, AuthUser};
use crate::models::{AvatarUpload, NewProfile, ProfileResponse, UserProfile};
use s3_utils::ObjectStore;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

/// Storage key for a user's avatar
pub fn avatar_key(user_id: i64, filename: &str) -> String {
    let name: String = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let name = if name.is_empty() { "avatar".to_string() } else { name };
    format!("avatars/{}_{}", user_id, name)
}

impl ProfileService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    fn to_response(&self, profile: UserProfile) -> ProfileResponse {
        ProfileResponse {
            id: profile.id,
            user_id: profile.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            gender: profile.gender,
            date_of_birth: profile.date_of_birth,
            info: profile.info,
            avatar: profile.avatar.map(|key| self.storage.object_url(&key)),
        }
    }

    pub async fn create(
        &self,
        actor: &AuthUser,
        user_id: i64,
        fields: NewProfile,
        avatar: Option<AvatarUpload>,
    ) -> Result<ProfileResponse> {
        check_owner_or_staff(actor.id, actor.role, user_id)?;

        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found or not active.".into()))?;
        if profile_repo::find_by_user(&self.pool, user_id).await?.is_some() {
            return Err(AppError::BadRequest("User already has a profile.".into()));
        }

        let key = match avatar {
            Some(upload) => {
                let key = avatar_key(user_id, &upload.filename);
                self.storage
                    .put_object(&key, upload.bytes, &upload.content_type)
                    .await
                    .map_err(|e| {
                        error!(user_id, error = %e, "avatar upload failed");
                        AppError::StorageError("Failed to upload avatar.".into())
                    })?;
                Some(key)
            }
            None => None,
        };

        let profile =
            profile_repo::create_profile(&self.pool, user_id, &fields, key.as_deref()).await?;
        info!(user_id, "profile created");
        Ok(self.to_response(profile))
    }

    pub async fn get(&self, actor: &AuthUser, user_id: i64) -> Result<ProfileResponse> {
        check_owner_or_staff(actor.id, actor.role, user_id)?;
        let profile = profile_repo::find_by_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found.".into()))?;
        Ok(self.to_response(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_keys_keep_only_the_base_name() {
        assert_eq!(avatar_key(4, "me.png"), "avatars/4_me.png");
        assert_eq!(avatar_key(4, "../../etc/passwd"), "avatars/4_passwd");
        assert_eq!(avatar_key(4, "my photo.jpg"), "avatars/4_my_photo.jpg");
        assert_eq!(avatar_key(4, ""), "avatars/4_avatar");
    }
}

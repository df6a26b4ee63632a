use crate::models::{NewProfile, UserProfile};
use sqlx::postgres::PgExecutor;

const PROFILE_COLUMNS: &str =
    "id, user_id, first_name, last_name, avatar, gender, date_of_birth, info";

pub async fn find_by_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Option<UserProfile>, sqlx::Error> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1");
    sqlx::query_as::<_, UserProfile>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn create_profile<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    profile: &NewProfile,
    avatar_key: Option<&str>,
) -> Result<UserProfile, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO user_profiles (user_id, first_name, last_name, avatar, gender, date_of_birth, info)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PROFILE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, UserProfile>(&sql)
        .bind(user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(avatar_key)
        .bind(profile.gender)
        .bind(profile.date_of_birth)
        .bind(&profile.info)
        .fetch_one(executor)
        .await
}

/// Moderator tools: user lookup and catalog management
use super::CatalogService;
use crate::db::catalog_repo::{self, NamedTable};
use crate::db::{movie_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::{
    MessageResponse, MovieCreateRequest, MovieDetail, MovieUpdateRequest, PageRequest,
    UserListQuery, UserListResponse, UserResponse,
};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use validator::Validate;

pub const MAX_USERS_PER_PAGE: i64 = 50;

pub struct ModerationService {
    pool: PgPool,
}

fn movie_not_found() -> AppError {
    AppError::NotFound("Movie with the given ID was not found.".into())
}

/// Trimmed, non-empty, first occurrence wins (case-insensitive)
fn clean_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn check_price(price: Option<Decimal>) -> Result<()> {
    if price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation("price", "price must not be negative"));
    }
    Ok(())
}

fn duplicate_movie(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(
            "A movie with the same name, year and time already exists.".into(),
        ),
        _ => err.into(),
    }
}

async fn named_ids(
    conn: &mut PgConnection,
    table: NamedTable,
    names: &[String],
) -> Result<Vec<i32>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in clean_names(names) {
        ids.push(catalog_repo::upsert_named(&mut *conn, table, &name).await?);
    }
    Ok(ids)
}

impl ModerationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_users(&self, query: &UserListQuery) -> Result<UserListResponse> {
        let page = PageRequest::new(query.page, query.per_page, MAX_USERS_PER_PAGE)?;
        let total_items = user_repo::count_users(&self.pool).await?;
        let users = user_repo::list_users(&self.pool, page.per_page, page.offset()?).await?;
        Ok(UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages(total_items),
            total_items,
        })
    }

    pub async fn get_user(&self, user_id: i64) -> Result<UserResponse> {
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    async fn check_references(
        &self,
        certification_id: Option<i32>,
        genre_ids: Option<&[i32]>,
    ) -> Result<()> {
        if let Some(id) = certification_id {
            if catalog_repo::find_named(&self.pool, NamedTable::Certification, id)
                .await?
                .is_none()
            {
                return Err(AppError::BadRequest("Invalid certification_id".into()));
            }
        }
        if let Some(ids) = genre_ids {
            let missing = catalog_repo::missing_genre_ids(&self.pool, ids).await?;
            if !missing.is_empty() {
                return Err(AppError::BadRequest(format!(
                    "Genres not found: {:?}",
                    missing
                )));
            }
        }
        Ok(())
    }

    pub async fn create_movie(&self, req: MovieCreateRequest) -> Result<MovieDetail> {
        req.validate()?;
        check_price(Some(req.price))?;
        self.check_references(Some(req.certification_id), Some(&req.genre_ids))
            .await?;

        let mut tx = self.pool.begin().await?;
        let movie = movie_repo::insert_movie(&mut tx, &req)
            .await
            .map_err(duplicate_movie)?;
        movie_repo::replace_genres(&mut tx, movie.id, &req.genre_ids).await?;
        let star_ids = named_ids(&mut tx, NamedTable::Star, &req.stars).await?;
        movie_repo::replace_stars(&mut tx, movie.id, &star_ids).await?;
        let director_ids = named_ids(&mut tx, NamedTable::Director, &req.directors).await?;
        movie_repo::replace_directors(&mut tx, movie.id, &director_ids).await?;
        tx.commit().await?;

        info!(movie_id = movie.id, name = %movie.name, "movie created");
        CatalogService::new(self.pool.clone()).detail(movie.id).await
    }

    pub async fn update_movie(
        &self,
        movie_id: i64,
        req: MovieUpdateRequest,
    ) -> Result<MessageResponse> {
        req.validate()?;
        check_price(req.price)?;
        self.check_references(req.certification_id, req.genre_ids.as_deref())
            .await?;

        let mut tx = self.pool.begin().await?;
        let movie = movie_repo::update_movie(&mut tx, movie_id, &req)
            .await
            .map_err(duplicate_movie)?
            .ok_or_else(movie_not_found)?;
        if let Some(genre_ids) = &req.genre_ids {
            movie_repo::replace_genres(&mut tx, movie.id, genre_ids).await?;
        }
        if let Some(stars) = &req.stars {
            let ids = named_ids(&mut tx, NamedTable::Star, stars).await?;
            movie_repo::replace_stars(&mut tx, movie.id, &ids).await?;
        }
        if let Some(directors) = &req.directors {
            let ids = named_ids(&mut tx, NamedTable::Director, directors).await?;
            movie_repo::replace_directors(&mut tx, movie.id, &ids).await?;
        }
        tx.commit().await?;

        info!(movie_id, "movie updated");
        Ok(MessageResponse::new("Movie updated successfully."))
    }

    pub async fn delete_movie(&self, movie_id: i64) -> Result<()> {
        if !movie_repo::movie_exists(&self.pool, movie_id).await? {
            return Err(movie_not_found());
        }
        if movie_repo::appears_in_orders(&self.pool, movie_id).await? {
            return Err(AppError::Conflict(
                "Movie is referenced by orders and cannot be deleted.".into(),
            ));
        }
        movie_repo::delete_movie(&self.pool, movie_id).await?;
        info!(movie_id, "movie deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_deduplicated() {
        let names = vec![
            " Tom Hanks ".to_string(),
            "tom hanks".to_string(),
            "".to_string(),
            "Meg Ryan".to_string(),
        ];
        assert_eq!(clean_names(&names), vec!["Tom Hanks", "Meg Ryan"]);
    }

    #[test]
    fn negative_prices_are_rejected() {
        assert!(check_price(Some(Decimal::NEGATIVE_ONE)).is_err());
        assert!(check_price(Some(Decimal::ZERO)).is_ok());
        assert!(check_price(None).is_ok());
    }
}

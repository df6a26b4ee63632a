/// Per-user movie ratings and the movie's rating aggregate
use crate::db::{movie_repo, rating_repo};
use crate::error::{AppError, Result};
use crate::models::{RatingRequest, RatingSummary, UserRating};
use sqlx::PgPool;
use tracing::debug;
use validator::Validate;

pub struct RatingService {
    pool: PgPool,
}

fn movie_not_found() -> AppError {
    AppError::NotFound("Movie with the given ID was not found.".into())
}

fn not_rated() -> AppError {
    AppError::NotFound("You haven't rated this movie yet.".into())
}

impl RatingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the caller's rating and recompute the aggregate under the movie lock
    pub async fn rate(
        &self,
        user_id: i64,
        movie_id: i64,
        req: RatingRequest,
    ) -> Result<RatingSummary> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        if !movie_repo::lock_movie(&mut tx, movie_id).await? {
            return Err(movie_not_found());
        }
        let rating = rating_repo::upsert_rating(&mut *tx, user_id, movie_id, req.rating).await?;
        let (rating_average, rating_count) =
            rating_repo::recompute_aggregate(&mut *tx, movie_id).await?;
        tx.commit().await?;

        debug!(user_id, movie_id, rating = rating.rating, "movie rated");
        Ok(RatingSummary {
            movie_id,
            rating: rating.rating,
            rating_average,
            rating_count,
        })
    }

    pub async fn get(&self, user_id: i64, movie_id: i64) -> Result<UserRating> {
        if !movie_repo::movie_exists(&self.pool, movie_id).await? {
            return Err(movie_not_found());
        }
        rating_repo::find_rating(&self.pool, user_id, movie_id)
            .await?
            .ok_or_else(not_rated)
    }

    pub async fn remove(&self, user_id: i64, movie_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if !movie_repo::lock_movie(&mut tx, movie_id).await? {
            return Err(movie_not_found());
        }
        if !rating_repo::delete_rating(&mut *tx, user_id, movie_id).await? {
            return Err(not_rated());
        }
        rating_repo::recompute_aggregate(&mut *tx, movie_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

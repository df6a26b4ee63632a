/// Like/dislike toggles and favorites
use crate::db::movie_repo::{self, Counter};
use crate::db::reaction_repo;
use crate::error::{AppError, Result};
use crate::models::{FavoriteResponse, Reaction, ReactionResponse};
use sqlx::PgPool;

pub struct ReactionService {
    pool: PgPool,
}

fn counter_for(reaction: Reaction) -> Counter {
    match reaction {
        Reaction::Like => Counter::Like,
        Reaction::Dislike => Counter::Dislike,
    }
}

/// Outcome of pressing `pressed` while `current` is recorded
pub fn next_reaction(current: Option<Reaction>, pressed: Reaction) -> Option<Reaction> {
    match current {
        Some(existing) if existing == pressed => None,
        _ => Some(pressed),
    }
}

impl ReactionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn toggle_reaction(
        &self,
        user_id: i64,
        movie_id: i64,
        pressed: Reaction,
    ) -> Result<ReactionResponse> {
        let mut tx = self.pool.begin().await?;
        if !movie_repo::lock_movie(&mut tx, movie_id).await? {
            return Err(AppError::NotFound(
                "Movie with the given ID was not found.".into(),
            ));
        }

        let current = reaction_repo::find_reaction(&mut *tx, user_id, movie_id)
            .await?
            .map(Reaction::from_is_like);
        let next = next_reaction(current, pressed);

        if let Some(previous) = current {
            movie_repo::adjust_counter(&mut *tx, movie_id, counter_for(previous), -1).await?;
        }
        match next {
            Some(reaction) => {
                reaction_repo::set_reaction(&mut *tx, user_id, movie_id, reaction.is_like())
                    .await?;
                movie_repo::adjust_counter(&mut *tx, movie_id, counter_for(reaction), 1).await?;
            }
            None => {
                reaction_repo::delete_reaction(&mut *tx, user_id, movie_id).await?;
            }
        }
        tx.commit().await?;

        Ok(ReactionResponse { reaction: next })
    }

    pub async fn toggle_favorite(&self, user_id: i64, movie_id: i64) -> Result<FavoriteResponse> {
        let mut tx = self.pool.begin().await?;
        if !movie_repo::lock_movie(&mut tx, movie_id).await? {
            return Err(AppError::NotFound(
                "Movie with the given ID was not found.".into(),
            ));
        }

        let favorited = if reaction_repo::add_favorite(&mut *tx, user_id, movie_id).await? {
            movie_repo::adjust_counter(&mut *tx, movie_id, Counter::Favorite, 1).await?;
            true
        } else {
            reaction_repo::remove_favorite(&mut *tx, user_id, movie_id).await?;
            movie_repo::adjust_counter(&mut *tx, movie_id, Counter::Favorite, -1).await?;
            false
        };
        tx.commit().await?;

        Ok(FavoriteResponse { favorited })
    }

    pub async fn remove_favorite(&self, user_id: i64, movie_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if !movie_repo::lock_movie(&mut tx, movie_id).await? {
            return Err(AppError::NotFound(
                "Movie with the given ID was not found.".into(),
            ));
        }
        if !reaction_repo::remove_favorite(&mut *tx, user_id, movie_id).await? {
            return Err(AppError::NotFound("Movie is not in favorites.".into()));
        }
        movie_repo::adjust_counter(&mut *tx, movie_id, Counter::Favorite, -1).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressing_the_same_reaction_clears_it() {
        assert_eq!(next_reaction(Some(Reaction::Like), Reaction::Like), None);
        assert_eq!(next_reaction(Some(Reaction::Dislike), Reaction::Dislike), None);
    }

    #[test]
    fn pressing_the_opposite_reaction_switches() {
        assert_eq!(
            next_reaction(Some(Reaction::Like), Reaction::Dislike),
            Some(Reaction::Dislike)
        );
        assert_eq!(next_reaction(None, Reaction::Like), Some(Reaction::Like));
    }
}

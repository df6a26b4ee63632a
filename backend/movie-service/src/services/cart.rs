/// One shopping cart per user
use crate::db::{cart_repo, movie_repo, order_repo};
use crate::error::{AppError, Result};
use crate::models::CartResponse;
use sqlx::PgPool;
use tracing::debug;

pub struct CartService {
    pool: PgPool,
}

impl CartService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: i64) -> Result<CartResponse> {
        let cart = cart_repo::get_or_create(&self.pool, user_id).await?;
        let items = cart_repo::list_items(&self.pool, cart.id).await?;
        Ok(CartResponse::new(&cart, items))
    }

    pub async fn add(&self, user_id: i64, movie_id: i64) -> Result<CartResponse> {
        if !movie_repo::movie_exists(&self.pool, movie_id).await? {
            return Err(AppError::NotFound(
                "Movie with the given ID was not found.".into(),
            ));
        }
        if !order_repo::purchased_movie_ids(&self.pool, user_id, &[movie_id])
            .await?
            .is_empty()
        {
            return Err(AppError::duplicate_purchase());
        }

        let cart = cart_repo::get_or_create(&self.pool, user_id).await?;
        if !cart_repo::add_item(&self.pool, cart.id, movie_id).await? {
            return Err(AppError::BadRequest("Movie is already in the cart.".into()));
        }
        debug!(user_id, movie_id, "movie added to cart");

        let items = cart_repo::list_items(&self.pool, cart.id).await?;
        Ok(CartResponse::new(&cart, items))
    }

    pub async fn remove(&self, user_id: i64, movie_id: i64) -> Result<()> {
        let not_in_cart = || AppError::NotFound("Item not in cart.".into());
        let cart = cart_repo::find_by_user(&self.pool, user_id)
            .await?
            .ok_or_else(not_in_cart)?;
        if !cart_repo::remove_item(&self.pool, cart.id, movie_id).await? {
            return Err(not_in_cart());
        }
        Ok(())
    }

    pub async fn clear(&self, user_id: i64) -> Result<()> {
        if let Some(cart) = cart_repo::find_by_user(&self.pool, user_id).await? {
            let removed = cart_repo::clear(&self.pool, cart.id).await?;
            debug!(user_id, removed, "cart cleared");
        }
        Ok(())
    }
}

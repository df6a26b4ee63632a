/// Public catalog reads: filtered movie pages, movie detail and genres
use crate::db::catalog_repo::{self, NamedTable};
use crate::db::movie_repo;
use crate::error::{AppError, Result};
use crate::models::{
    neighbour_links, GenreWithCount, MovieDetail, MovieListQuery, MovieListResponse, MovieScope,
    PageRequest,
};
use sqlx::PgPool;

pub const MAX_MOVIES_PER_PAGE: i64 = 20;

pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of movies within `scope`.
    ///
    /// With `allow_empty` an empty result is a normal empty page; otherwise
    /// it is reported as 404.
    pub async fn list(
        &self,
        query: &MovieListQuery,
        scope: MovieScope,
        path: &str,
        allow_empty: bool,
    ) -> Result<MovieListResponse> {
        let filter = query.to_filter()?;
        let page = PageRequest::new(query.page, query.per_page, MAX_MOVIES_PER_PAGE)?;

        let total_items = movie_repo::count_movies(&self.pool, &filter, scope).await?;
        if total_items == 0 {
            if allow_empty {
                return Ok(MovieListResponse {
                    movies: Vec::new(),
                    prev_page: None,
                    next_page: None,
                    total_pages: 0,
                    total_items: 0,
                });
            }
            return Err(AppError::NotFound("No movies found.".into()));
        }
        let total_pages = page.ensure_in_range(total_items)?;

        let movies = movie_repo::list_movies(
            &self.pool,
            &filter,
            scope,
            page.per_page,
            page.offset()?,
        )
        .await?;
        let (prev_page, next_page) =
            neighbour_links(path, page, total_pages, &filter.link_params());

        Ok(MovieListResponse {
            movies,
            prev_page,
            next_page,
            total_pages,
            total_items,
        })
    }

    pub async fn detail(&self, movie_id: i64) -> Result<MovieDetail> {
        let movie = movie_repo::find_movie(&self.pool, movie_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie with the given ID was not found.".into()))?;

        let certification =
            catalog_repo::find_named(&self.pool, NamedTable::Certification, movie.certification_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!("movie {} has no certification", movie.id))
                })?;
        let genres = movie_repo::movie_genres(&self.pool, movie.id).await?;
        let stars = movie_repo::movie_stars(&self.pool, movie.id).await?;
        let directors = movie_repo::movie_directors(&self.pool, movie.id).await?;

        Ok(MovieDetail {
            id: movie.id,
            uuid: movie.uuid,
            name: movie.name,
            year: movie.year,
            time: movie.time,
            imdb: movie.imdb,
            votes: movie.votes,
            meta_score: movie.meta_score,
            gross: movie.gross,
            description: movie.description,
            price: movie.price,
            certification,
            genres,
            stars,
            directors,
            rating_average: movie.rating_average,
            rating_count: movie.rating_count,
            like_count: movie.like_count,
            dislike_count: movie.dislike_count,
            favorite_count: movie.favorite_count,
            comment_count: movie.comment_count,
        })
    }

    pub async fn genres(&self) -> Result<Vec<GenreWithCount>> {
        Ok(catalog_repo::list_genres_with_counts(&self.pool).await?)
    }

    pub async fn genre_movies(
        &self,
        genre_id: i32,
        query: &MovieListQuery,
    ) -> Result<MovieListResponse> {
        catalog_repo::find_named(&self.pool, NamedTable::Genre, genre_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Genre not found.".into()))?;
        let path = format!("/api/v1/genres/{}/movies", genre_id);
        self.list(query, MovieScope::Genre(genre_id), &path, false)
            .await
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};

/// Id + name pair used for certifications, genres, stars and directors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct NamedItem {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct GenreWithCount {
    pub id: i32,
    pub name: String,
    pub movie_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub year: i32,
    pub time: i32,
    pub imdb: f64,
    pub votes: i32,
    pub meta_score: Option<f64>,
    pub gross: Option<f64>,
    pub description: String,
    pub price: Decimal,
    pub certification_id: i32,
    pub rating_average: Option<f64>,
    pub rating_count: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub favorite_count: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of list endpoints
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MovieListItem {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub year: i32,
    pub time: i32,
    pub imdb: f64,
    pub votes: i32,
    pub price: Decimal,
    pub rating_average: Option<f64>,
    pub rating_count: i32,
    pub like_count: i32,
    pub favorite_count: i32,
    pub comment_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovieListResponse {
    pub movies: Vec<MovieListItem>,
    pub prev_page: Option<String>,
    pub next_page: Option<String>,
    pub total_pages: i64,
    pub total_items: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovieDetail {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub year: i32,
    pub time: i32,
    pub imdb: f64,
    pub votes: i32,
    pub meta_score: Option<f64>,
    pub gross: Option<f64>,
    pub description: String,
    pub price: Decimal,
    pub certification: NamedItem,
    pub genres: Vec<NamedItem>,
    pub stars: Vec<NamedItem>,
    pub directors: Vec<NamedItem>,
    pub rating_average: Option<f64>,
    pub rating_count: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub favorite_count: i32,
    pub comment_count: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Price,
    Year,
    #[default]
    Imdb,
    Votes,
    Time,
}

impl SortBy {
    /// Column name; only ever one of these fixed identifiers
    pub fn column(&self) -> &'static str {
        match self {
            SortBy::Price => "m.price",
            SortBy::Year => "m.year",
            SortBy::Imdb => "m.imdb",
            SortBy::Votes => "m.votes",
            SortBy::Time => "m.time",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Price => "price",
            SortBy::Year => "year",
            SortBy::Imdb => "imdb",
            SortBy::Votes => "votes",
            SortBy::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query string of the movie list endpoints
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
pub struct MovieListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub actor: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    #[validate(range(min = 1895, message = "year_min must be 1895 or later"))]
    pub year_min: Option<i32>,
    #[validate(range(min = 1895, message = "year_max must be 1895 or later"))]
    pub year_max: Option<i32>,
    #[validate(range(min = 0.0, max = 10.0, message = "imdb_min must be between 0 and 10"))]
    pub imdb_min: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0, message = "imdb_max must be between 0 and 10"))]
    pub imdb_max: Option<f64>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

/// Validated filter set used to build catalog queries
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub actor: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub imdb_min: Option<f64>,
    pub imdb_max: Option<f64>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn ordered<T: PartialOrd>(min: Option<T>, max: Option<T>, name: &str) -> Result<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(AppError::BadRequest(format!(
                "{name}_min must be less than or equal to {name}_max"
            )));
        }
    }
    Ok(())
}

impl MovieListQuery {
    pub fn to_filter(&self) -> Result<MovieFilter> {
        self.validate()?;
        for (field, value) in [("price_min", self.price_min), ("price_max", self.price_max)] {
            if value.is_some_and(|v| v < Decimal::ZERO) {
                return Err(AppError::validation(field, format!("{field} must not be negative")));
            }
        }
        ordered(self.year_min, self.year_max, "year")?;
        ordered(self.imdb_min, self.imdb_max, "imdb")?;
        ordered(self.price_min, self.price_max, "price")?;

        Ok(MovieFilter {
            title: non_blank(&self.title),
            description: non_blank(&self.description),
            actor: non_blank(&self.actor),
            director: non_blank(&self.director),
            genre: non_blank(&self.genre),
            year_min: self.year_min,
            year_max: self.year_max,
            imdb_min: self.imdb_min,
            imdb_max: self.imdb_max,
            price_min: self.price_min,
            price_max: self.price_max,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        })
    }
}

impl MovieFilter {
    /// Active filters as query parameters for pagination links
    pub fn link_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let text = [
            ("title", &self.title),
            ("description", &self.description),
            ("actor", &self.actor),
            ("director", &self.director),
            ("genre", &self.genre),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                params.push((key, value.clone()));
            }
        }
        if let Some(v) = self.year_min {
            params.push(("year_min", v.to_string()));
        }
        if let Some(v) = self.year_max {
            params.push(("year_max", v.to_string()));
        }
        if let Some(v) = self.imdb_min {
            params.push(("imdb_min", v.to_string()));
        }
        if let Some(v) = self.imdb_max {
            params.push(("imdb_max", v.to_string()));
        }
        if let Some(v) = self.price_min {
            params.push(("price_min", v.to_string()));
        }
        if let Some(v) = self.price_max {
            params.push(("price_max", v.to_string()));
        }
        params.push(("sort_by", self.sort_by.as_str().to_string()));
        params.push(("sort_order", self.sort_order.as_str().to_string()));
        params
    }
}

/// Which slice of the catalog a list query runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieScope {
    All,
    FavoritesOf(i64),
    Genre(i32),
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MovieCreateRequest {
    #[validate(length(min = 1, max = 250))]
    pub name: String,
    #[validate(range(min = 1895, max = 2100))]
    pub year: i32,
    #[validate(range(min = 1))]
    pub time: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub imdb: f64,
    #[validate(range(min = 0))]
    pub votes: i32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub meta_score: Option<f64>,
    #[validate(range(min = 0.0))]
    pub gross: Option<f64>,
    #[validate(length(min = 1))]
    pub description: String,
    pub price: Decimal,
    pub certification_id: i32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub stars: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct MovieUpdateRequest {
    #[validate(length(min = 1, max = 250))]
    pub name: Option<String>,
    #[validate(range(min = 1895, max = 2100))]
    pub year: Option<i32>,
    #[validate(range(min = 1))]
    pub time: Option<i32>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub imdb: Option<f64>,
    #[validate(range(min = 0))]
    pub votes: Option<i32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub meta_score: Option<f64>,
    #[validate(range(min = 0.0))]
    pub gross: Option<f64>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub certification_id: Option<i32>,
    pub genre_ids: Option<Vec<i32>>,
    pub stars: Option<Vec<String>>,
    pub directors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RatingRequest {
    #[validate(range(min = 1, max = 10, message = "rating must be between 1 and 10"))]
    pub rating: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingSummary {
    pub movie_id: i64,
    pub rating: i16,
    pub rating_average: Option<f64>,
    pub rating_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserRating {
    pub movie_id: i64,
    pub rating: i16,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn is_like(&self) -> bool {
        matches!(self, Reaction::Like)
    }

    pub fn from_is_like(is_like: bool) -> Self {
        if is_like {
            Reaction::Like
        } else {
            Reaction::Dislike
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReactionResponse {
    pub reaction: Option<Reaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteResponse {
    pub favorited: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn defaults_sort_by_imdb_desc() {
        let filter = MovieListQuery::default().to_filter().unwrap();
        assert_eq!(filter.sort_by, SortBy::Imdb);
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }

    #[test]
    fn inverted_ranges_are_rejected_with_named_bounds() {
        let query = MovieListQuery {
            year_min: Some(2010),
            year_max: Some(2000),
            ..Default::default()
        };
        let err = query.to_filter().unwrap_err();
        assert_eq!(err.message(), "year_min must be less than or equal to year_max");

        let query = MovieListQuery {
            price_min: Some(dec("9.99")),
            price_max: Some(dec("1.00")),
            ..Default::default()
        };
        assert_eq!(
            query.to_filter().unwrap_err().message(),
            "price_min must be less than or equal to price_max"
        );
    }

    #[test]
    fn out_of_range_values_are_validation_errors() {
        let query = MovieListQuery {
            year_min: Some(1800),
            ..Default::default()
        };
        assert!(matches!(query.to_filter(), Err(AppError::ValidationError(..))));

        let query = MovieListQuery {
            imdb_max: Some(11.0),
            ..Default::default()
        };
        assert!(matches!(query.to_filter(), Err(AppError::ValidationError(..))));

        let query = MovieListQuery {
            price_min: Some(dec("-1")),
            ..Default::default()
        };
        assert!(matches!(query.to_filter(), Err(AppError::ValidationError(..))));
    }

    #[test]
    fn blank_text_filters_are_dropped() {
        let query = MovieListQuery {
            title: Some("   ".into()),
            genre: Some(" Drama ".into()),
            ..Default::default()
        };
        let filter = query.to_filter().unwrap();
        assert!(filter.title.is_none());
        assert_eq!(filter.genre.as_deref(), Some("Drama"));
    }

    #[test]
    fn link_params_include_sort_and_active_filters() {
        let query = MovieListQuery {
            genre: Some("Drama".into()),
            year_min: Some(1990),
            sort_by: Some(SortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let params = query.to_filter().unwrap().link_params();
        assert!(params.contains(&("genre", "Drama".to_string())));
        assert!(params.contains(&("year_min", "1990".to_string())));
        assert!(params.contains(&("sort_by", "price".to_string())));
        assert!(params.contains(&("sort_order", "asc".to_string())));
    }

    #[test]
    fn sort_columns_are_fixed_identifiers() {
        for sort in [SortBy::Price, SortBy::Year, SortBy::Imdb, SortBy::Votes, SortBy::Time] {
            assert!(sort.column().starts_with("m."));
        }
    }
}

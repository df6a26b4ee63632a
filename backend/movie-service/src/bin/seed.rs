//! Reference data seeding.
//!
//! Usage: `movie-seed [--demo N]`. Set `ADMIN_EMAIL` and `ADMIN_PASSWORD` to
//! create (or promote) an active admin account.

use anyhow::{bail, Context};
use movie_service::bootstrap;
use movie_service::db::catalog_repo::{self, NamedTable};
use movie_service::db::{movie_repo, user_repo, MIGRATOR};
use movie_service::models::{MovieCreateRequest, Role};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;

const CERTIFICATIONS: [&str; 5] = ["G", "PG", "PG-13", "R", "NC-17"];

const GENRES: [&str; 10] = [
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Horror",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "Fantasy",
    "Animation",
];

const TITLE_WORDS: [&str; 16] = [
    "Silent", "Crimson", "Last", "Hidden", "Broken", "Golden", "Midnight", "Lost", "River",
    "Empire", "Shadow", "Garden", "Storm", "Signal", "Harbor", "Frontier",
];

const FIRST_NAMES: [&str; 8] = [
    "Alex", "Maria", "Chen", "Olivia", "Samuel", "Priya", "Jonas", "Lena",
];
const LAST_NAMES: [&str; 8] = [
    "Novak", "Garcia", "Kim", "Moreau", "Okafor", "Lindqvist", "Rossi", "Tanaka",
];

fn parse_demo_count(args: &[String]) -> anyhow::Result<usize> {
    match args.iter().position(|arg| arg == "--demo") {
        None => Ok(0),
        Some(index) => {
            let Some(value) = args.get(index + 1) else {
                bail!("--demo expects a movie count");
            };
            value
                .parse()
                .with_context(|| format!("invalid --demo count: {value}"))
        }
    }
}

struct DemoMovie {
    movie: MovieCreateRequest,
    genres: Vec<String>,
}

fn person(rng: &mut impl Rng) -> String {
    format!(
        "{} {}",
        FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())],
        LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())]
    )
}

/// Generated up front so no RNG is held across awaits
fn demo_movies(count: usize, certification_ids: &[i32]) -> Vec<DemoMovie> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|n| {
            let title = format!(
                "{} {} {}",
                TITLE_WORDS[rng.gen_range(0..TITLE_WORDS.len())],
                TITLE_WORDS[rng.gen_range(0..TITLE_WORDS.len())],
                n + 1
            );
            let genre_count = rng.gen_range(1..=3);
            let genres = GENRES
                .choose_multiple(&mut rng, genre_count)
                .map(|g| g.to_string())
                .collect();
            let star_count = rng.gen_range(1..=4);
            let stars = (0..star_count).map(|_| person(&mut rng)).collect();
            let directors = vec![person(&mut rng)];
            let imdb = (rng.gen_range(40..=95) as f64) / 10.0;
            DemoMovie {
                movie: MovieCreateRequest {
                    name: title,
                    year: rng.gen_range(1960..=2024),
                    time: rng.gen_range(80..=180),
                    imdb,
                    votes: rng.gen_range(100..=500_000),
                    meta_score: Some(rng.gen_range(30..=100) as f64),
                    gross: Some(rng.gen_range(1..=900) as f64 * 1_000_000.0),
                    description: "A demo catalog entry.".to_string(),
                    price: Decimal::new(rng.gen_range(299..=1999), 2),
                    certification_id: certification_ids[rng.gen_range(0..certification_ids.len())],
                    genre_ids: Vec::new(),
                    stars,
                    directors,
                },
                genres,
            }
        })
        .collect()
}

async fn seed_reference_data(pool: &PgPool) -> anyhow::Result<Vec<i32>> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO user_groups (name) VALUES ('user'), ('moderator'), ('admin') ON CONFLICT (name) DO NOTHING",
    )
    .execute(&mut *tx)
    .await?;

    let mut certification_ids = Vec::with_capacity(CERTIFICATIONS.len());
    for name in CERTIFICATIONS {
        certification_ids.push(
            catalog_repo::upsert_named(&mut *tx, NamedTable::Certification, name).await?,
        );
    }
    for name in GENRES {
        catalog_repo::upsert_named(&mut *tx, NamedTable::Genre, name).await?;
    }
    tx.commit().await?;

    tracing::info!(
        certifications = CERTIFICATIONS.len(),
        genres = GENRES.len(),
        "reference data seeded"
    );
    Ok(certification_ids)
}

async fn insert_demo_movie(pool: &PgPool, demo: &DemoMovie) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    let movie = movie_repo::insert_movie(&mut tx, &demo.movie).await?;

    let mut genre_ids = Vec::new();
    for name in &demo.genres {
        genre_ids.push(catalog_repo::upsert_named(&mut *tx, NamedTable::Genre, name).await?);
    }
    let mut star_ids = Vec::new();
    for name in &demo.movie.stars {
        star_ids.push(catalog_repo::upsert_named(&mut *tx, NamedTable::Star, name).await?);
    }
    let mut director_ids = Vec::new();
    for name in &demo.movie.directors {
        director_ids.push(catalog_repo::upsert_named(&mut *tx, NamedTable::Director, name).await?);
    }
    movie_repo::replace_genres(&mut tx, movie.id, &genre_ids).await?;
    movie_repo::replace_stars(&mut tx, movie.id, &star_ids).await?;
    movie_repo::replace_directors(&mut tx, movie.id, &director_ids).await?;
    tx.commit().await?;
    Ok(())
}

async fn seed_admin(pool: &PgPool, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    match user_repo::find_by_email(pool, &email).await? {
        Some(user) => {
            user_repo::set_role(pool, user.id, Role::Admin).await?;
            user_repo::set_active(pool, user.id, true).await?;
            tracing::info!(user_id = user.id, "existing account promoted to admin");
        }
        None => {
            crypto_core::password::validate_password_strength(password)
                .context("ADMIN_PASSWORD is too weak")?;
            let hashed = crypto_core::password::hash_password(password)?;
            let user = user_repo::create_user(pool, &email, &hashed, true, Role::Admin).await?;
            tracing::info!(user_id = user.id, "admin account created");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = bootstrap::load_config();
    bootstrap::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let demo_count = parse_demo_count(&args)?;

    let pool = bootstrap::connect_database(&config, "movie-seed").await?;
    db_pool::run_migrations(&pool, &MIGRATOR).await?;

    let certification_ids = seed_reference_data(&pool).await?;

    if demo_count > 0 {
        let mut inserted = 0usize;
        for demo in demo_movies(demo_count, &certification_ids) {
            match insert_demo_movie(&pool, &demo).await {
                Ok(()) => inserted += 1,
                Err(e) => tracing::warn!(name = %demo.movie.name, error = %e, "skipped demo movie"),
            }
        }
        tracing::info!(requested = demo_count, inserted, "demo catalog seeded");
    }

    if let (Ok(email), Ok(password)) = (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        seed_admin(&pool, &email, &password).await?;
    }

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_count_defaults_to_zero() {
        assert_eq!(parse_demo_count(&[]).unwrap(), 0);
        let args = vec!["--demo".to_string(), "25".to_string()];
        assert_eq!(parse_demo_count(&args).unwrap(), 25);
        assert!(parse_demo_count(&["--demo".to_string()]).is_err());
    }

    #[test]
    fn demo_movies_use_known_certifications() {
        let movies = demo_movies(10, &[3, 4]);
        assert_eq!(movies.len(), 10);
        for demo in movies {
            assert!([3, 4].contains(&demo.movie.certification_id));
            assert!(!demo.genres.is_empty());
            assert_eq!(demo.movie.directors.len(), 1);
        }
    }
}

/// Database access layer
///
/// Free-function repositories over `sqlx`. Single-statement functions are
/// generic over the executor so they run against the pool or inside a
/// transaction; multi-statement ones take a `&mut PgConnection`.
pub mod cart_repo;
pub mod catalog_repo;
pub mod comment_repo;
pub mod movie_repo;
pub mod notification_repo;
pub mod order_repo;
pub mod payment_repo;
pub mod profile_repo;
pub mod rating_repo;
pub mod reaction_repo;
pub mod token_repo;
pub mod user_repo;

use sqlx::migrate::Migrator;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
pub fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("star"), "%star%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }
}

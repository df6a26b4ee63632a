/// Business logic layer
///
/// Services own transactions and call the free-function repositories in
/// `crate::db`. Side effects that leave the process (email, payments,
/// object storage) go through traits so tests can substitute them.
pub mod accounts;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod comments;
pub mod moderation;
pub mod orders;
pub mod payment_gateway;
pub mod payments;
pub mod profiles;
pub mod ratings;
pub mod reactions;
pub mod token_revocation;

pub use accounts::AccountService;
pub use admin::AdminService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use comments::CommentService;
pub use moderation::ModerationService;
pub use orders::OrderService;
pub use payment_gateway::{PaymentGateway, StripeGateway};
pub use payments::PaymentService;
pub use profiles::ProfileService;
pub use ratings::RatingService;
pub use reactions::ReactionService;
pub use token_revocation::{RedisRevocationStore, RevocationStore};

/// Absolute links embedded in emails
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn activation(&self, email: &str, token: &str) -> String {
        format!(
            "{}/api/v1/accounts/activate?email={}&token={}",
            self.base_url,
            urlencoding::encode(email),
            urlencoding::encode(token)
        )
    }

    pub fn login(&self) -> String {
        format!("{}/api/v1/accounts/login", self.base_url)
    }

    pub fn password_reset(&self, email: &str, token: &str) -> String {
        format!(
            "{}/api/v1/accounts/password-reset/complete?email={}&token={}",
            self.base_url,
            urlencoding::encode(email),
            urlencoding::encode(token)
        )
    }

    pub fn comment(&self, movie_id: i64, comment_id: i64) -> String {
        format!(
            "{}/api/v1/movies/{}/comments/{}",
            self.base_url, movie_id, comment_id
        )
    }
}

/// Emails are compared and stored lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_absolute_and_encoded() {
        let links = LinkBuilder::new("http://localhost:8000/");
        assert_eq!(
            links.activation("a+b@x.io", "tok"),
            "http://localhost:8000/api/v1/accounts/activate?email=a%2Bb%40x.io&token=tok"
        );
        assert_eq!(
            links.comment(3, 9),
            "http://localhost:8000/api/v1/movies/3/comments/9"
        );
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Bob@Example.COM "), "bob@example.com");
    }
}

/// OpenAPI documentation for the movie store service
use crate::models::*;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Movie Store API",
        version = "1.0.0",
        description = "Online movie store: accounts and profiles, the movie catalog with ratings, reactions and threaded comments, carts, orders and card payments. Moderator and admin routes manage the catalog, users and refunds.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "accounts", description = "Registration, activation, login and password management"),
        (name = "profiles", description = "User profiles and avatars"),
        (name = "movies", description = "Catalog browsing, ratings, reactions and favorites"),
        (name = "comments", description = "Threaded comments, comment likes and notifications"),
        (name = "cart", description = "Shopping cart"),
        (name = "orders", description = "Checkout and order history"),
        (name = "payments", description = "Payment intents, provider webhooks and payment history"),
        (name = "moderator", description = "Catalog and user management for moderators"),
        (name = "admin", description = "Group changes, activation, counters and refunds"),
    ),
    components(schemas(
        MessageResponse,
        Role,
        UserResponse,
        UserListResponse,
        RegisterRequest,
        RegisteredUser,
        LoginRequest,
        ActivationRequest,
        EmailRequest,
        RefreshRequest,
        ChangePasswordRequest,
        PasswordResetCompleteRequest,
        TokenPairResponse,
        AccessTokenResponse,
        Gender,
        ProfileResponse,
        ChangeGroupRequest,
        SetActivationRequest,
        NamedItem,
        GenreWithCount,
        MovieListItem,
        MovieListResponse,
        MovieDetail,
        MovieCreateRequest,
        MovieUpdateRequest,
        SortBy,
        SortOrder,
        RatingRequest,
        RatingSummary,
        UserRating,
        Reaction,
        ReactionResponse,
        FavoriteResponse,
        PageInfo,
        CreateCommentRequest,
        UpdateCommentRequest,
        NotificationKind,
        Notification,
        CartItemView,
        CartResponse,
        AddToCartRequest,
        OrderStatus,
        OrderItemView,
        OrderResponse,
        PaymentStatus,
        PaymentItemView,
        PaymentResponse,
        PaymentProgress,
        PaymentProgressResponse,
        PaymentIntentResponse,
        WebhookAck,
        RecountResponse,
    )),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token issued by /api/v1/accounts/login"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn title() -> &'static str {
        "Movie Store"
    }

    pub fn version() -> &'static str {
        "1.0.0"
    }

    pub fn openapi_json_path() -> &'static str {
        "/api/v1/openapi.json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("MovieDetail"));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment joined with author and like data for the requesting user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub like_count: i64,
    pub user_has_liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i64,
    pub movie_id: i64,
    pub parent_id: Option<i64>,
    pub username: String,
    pub like_count: i64,
    pub user_has_liked: bool,
    pub replies: Vec<CommentNode>,
}

impl From<CommentRow> for CommentNode {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user_id: row.user_id,
            movie_id: row.movie_id,
            parent_id: row.parent_id,
            username: row.username,
            like_count: row.like_count,
            user_has_liked: row.user_has_liked,
            replies: Vec::new(),
        }
    }
}

/// Assemble reply trees under `roots`.
///
/// `descendants` may arrive in any order; replies are sorted oldest first.
/// Rows whose parent is neither a root nor another descendant are dropped.
pub fn build_comment_forest(roots: Vec<CommentRow>, descendants: Vec<CommentRow>) -> Vec<CommentNode> {
    let mut children: HashMap<i64, Vec<CommentRow>> = HashMap::new();
    for row in descendants {
        if let Some(parent_id) = row.parent_id {
            children.entry(parent_id).or_default().push(row);
        }
    }
    for replies in children.values_mut() {
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    }

    roots
        .into_iter()
        .map(|root| attach_replies(root.into(), &mut children))
        .collect()
}

fn attach_replies(mut node: CommentNode, children: &mut HashMap<i64, Vec<CommentRow>>) -> CommentNode {
    if let Some(replies) = children.remove(&node.id) {
        node.replies = replies
            .into_iter()
            .map(|reply| attach_replies(reply.into(), children))
            .collect();
    }
    node
}

/// `0`, `""` and `null` all mean "no parent"
fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(0)) => Ok(None),
        Some(Raw::Int(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) if text.trim().is_empty() || text.trim() == "0" => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("parent_id must be an integer")),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "content must be 1 to 2000 characters"))]
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "content must be 1 to 2000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CommentListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentNode>,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CommentReply,
    CommentLike,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub related_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// First `max_chars` characters, with an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head.trim_end())
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(id: i64, parent_id: Option<i64>, minutes: i64) -> CommentRow {
        CommentRow {
            id,
            movie_id: 1,
            user_id: 1,
            parent_id,
            content: format!("comment {id}"),
            created_at: DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(minutes),
            updated_at: DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(minutes),
            username: "a@b.c".into(),
            like_count: 0,
            user_has_liked: false,
        }
    }

    #[test]
    fn nested_replies_are_attached_at_every_depth() {
        let roots = vec![row(1, None, 0), row(2, None, 1)];
        let descendants = vec![row(5, Some(3), 4), row(3, Some(1), 2), row(4, Some(1), 3), row(6, Some(2), 5)];

        let forest = build_comment_forest(roots, descendants);
        assert_eq!(forest.len(), 2);
        let first = &forest[0];
        assert_eq!(first.replies.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(first.replies[0].replies[0].id, 5);
        assert_eq!(forest[1].replies[0].id, 6);
    }

    #[test]
    fn replies_sort_oldest_first() {
        let forest = build_comment_forest(vec![row(1, None, 0)], vec![row(9, Some(1), 10), row(8, Some(1), 5)]);
        assert_eq!(forest[0].replies.iter().map(|r| r.id).collect::<Vec<_>>(), vec![8, 9]);
    }

    #[test]
    fn orphans_are_ignored() {
        let forest = build_comment_forest(vec![row(1, None, 0)], vec![row(7, Some(99), 1)]);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn zero_and_blank_parent_ids_mean_top_level() {
        let a: CreateCommentRequest = serde_json::from_str(r#"{"content":"x","parent_id":0}"#).unwrap();
        let b: CreateCommentRequest = serde_json::from_str(r#"{"content":"x","parent_id":""}"#).unwrap();
        let c: CreateCommentRequest = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        let d: CreateCommentRequest = serde_json::from_str(r#"{"content":"x","parent_id":"12"}"#).unwrap();
        assert_eq!(a.parent_id, None);
        assert_eq!(b.parent_id, None);
        assert_eq!(c.parent_id, None);
        assert_eq!(d.parent_id, Some(12));
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }
}

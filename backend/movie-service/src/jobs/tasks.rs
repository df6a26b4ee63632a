use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit of background work. Payloads carry everything the handler needs so
/// the worker never has to re-read request state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "snake_case")]
pub enum Task {
    SendActivationEmail {
        email: String,
        activation_link: String,
    },
    SendActivationCompleteEmail {
        email: String,
        login_link: String,
    },
    SendPasswordResetEmail {
        email: String,
        reset_link: String,
    },
    SendPasswordResetCompleteEmail {
        email: String,
        login_link: String,
    },
    SendCommentReplyEmail {
        email: String,
        parent_preview: String,
        reply_preview: String,
        reply_link: String,
    },
    SendCommentLikeEmail {
        email: String,
        comment_preview: String,
        comment_link: String,
    },
    SendPaymentSuccessEmail {
        email: String,
        order_id: i64,
        amount: String,
        movies: Vec<String>,
    },
    CleanupExpiredTokens,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::SendActivationEmail { .. } => "send_activation_email",
            Task::SendActivationCompleteEmail { .. } => "send_activation_complete_email",
            Task::SendPasswordResetEmail { .. } => "send_password_reset_email",
            Task::SendPasswordResetCompleteEmail { .. } => "send_password_reset_complete_email",
            Task::SendCommentReplyEmail { .. } => "send_comment_reply_email",
            Task::SendCommentLikeEmail { .. } => "send_comment_like_email",
            Task::SendPaymentSuccessEmail { .. } => "send_payment_success_email",
            Task::CleanupExpiredTokens => "cleanup_expired_tokens",
        }
    }
}

/// Wire format of a queued task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub id: Uuid,
    pub task: Task,
    /// Failed executions so far
    pub attempts: u32,
    pub max_retries: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl TaskEnvelope {
    pub fn new(task: Task, max_retries: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            task,
            attempts: 0,
            max_retries,
            enqueued_at: Utc::now(),
        }
    }
}

/// Redis keys of one named queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeys {
    pub ready: String,
    pub delayed: String,
    pub dead: String,
}

impl QueueKeys {
    pub fn new(queue: &str) -> Self {
        let ready = format!("movie_store:tasks:{queue}");
        Self {
            delayed: format!("{ready}:delayed"),
            dead: format!("{ready}:dead"),
            ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_is_tagged_by_name() {
        let task = Task::SendActivationEmail {
            email: "a@b.io".into(),
            activation_link: "http://x".into(),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["name"], "send_activation_email");
        assert_eq!(value["args"]["email"], "a@b.io");
        assert_eq!(task.name(), "send_activation_email");
    }

    #[test]
    fn unit_task_parses_without_args() {
        let task: Task = serde_json::from_value(json!({"name": "cleanup_expired_tokens"})).unwrap();
        assert_eq!(task, Task::CleanupExpiredTokens);
    }

    #[test]
    fn queue_keys_share_prefix() {
        let keys = QueueKeys::new("default");
        assert_eq!(keys.ready, "movie_store:tasks:default");
        assert_eq!(keys.delayed, "movie_store:tasks:default:delayed");
        assert_eq!(keys.dead, "movie_store:tasks:default:dead");
    }
}

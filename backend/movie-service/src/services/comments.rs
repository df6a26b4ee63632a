/// Threaded comments, comment likes and in-app notifications
use super::LinkBuilder;
use crate::db::movie_repo::{self, Counter};
use crate::db::{comment_repo, notification_repo, user_repo};
use crate::error::{AppError, Result};
use crate::jobs::{Task, TaskDispatcher};
use crate::middleware::{check_comment_delete, check_comment_edit, AuthUser};
use crate::models::{
    build_comment_forest, preview, Comment, CommentListQuery, CommentListResponse, CommentNode,
    CreateCommentRequest, Notification, NotificationKind, PageRequest, UpdateCommentRequest,
};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

pub const MAX_COMMENTS_PER_PAGE: i64 = 50;
const PREVIEW_CHARS: usize = 100;

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found.".into())
}

fn movie_not_found() -> AppError {
    AppError::NotFound("Movie with the given ID was not found.".into())
}

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    tasks: TaskDispatcher,
    links: LinkBuilder,
}

impl CommentService {
    pub fn new(pool: PgPool, tasks: TaskDispatcher, links: LinkBuilder) -> Self {
        Self { pool, tasks, links }
    }

    pub async fn create(
        &self,
        author: &AuthUser,
        movie_id: i64,
        req: CreateCommentRequest,
    ) -> Result<Comment> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        if !movie_repo::lock_movie(&mut tx, movie_id).await? {
            return Err(movie_not_found());
        }
        let parent = match req.parent_id {
            Some(parent_id) => Some(
                comment_repo::find_in_movie(&mut *tx, movie_id, parent_id)
                    .await?
                    .ok_or_else(|| AppError::BadRequest("Invalid parent comment.".into()))?,
            ),
            None => None,
        };

        let comment = comment_repo::create_comment(
            &mut *tx,
            movie_id,
            author.id,
            req.parent_id,
            &req.content,
        )
        .await?;
        movie_repo::adjust_counter(&mut *tx, movie_id, Counter::Comment, 1).await?;

        // Replies to one's own comment stay silent
        let reply_target = parent.filter(|p| p.user_id != author.id);
        if let Some(parent) = &reply_target {
            notification_repo::create_notification(
                &mut *tx,
                parent.user_id,
                NotificationKind::CommentReply,
                comment.id,
                &format!("{} replied to your comment.", author.email),
            )
            .await?;
        }
        tx.commit().await?;

        info!(comment_id = comment.id, movie_id, "comment created");

        if let Some(parent) = reply_target {
            if let Some(recipient) = user_repo::find_by_id(&self.pool, parent.user_id).await? {
                self.tasks
                    .dispatch(Task::SendCommentReplyEmail {
                        email: recipient.email,
                        parent_preview: preview(&parent.content, PREVIEW_CHARS),
                        reply_preview: preview(&comment.content, PREVIEW_CHARS),
                        reply_link: self.links.comment(movie_id, comment.id),
                    })
                    .await;
            }
        }

        Ok(comment)
    }

    pub async fn list(
        &self,
        viewer_id: i64,
        movie_id: i64,
        query: &CommentListQuery,
    ) -> Result<CommentListResponse> {
        let page = PageRequest::new(query.page, query.per_page, MAX_COMMENTS_PER_PAGE)?;
        if !movie_repo::movie_exists(&self.pool, movie_id).await? {
            return Err(movie_not_found());
        }

        let total_items = comment_repo::count_roots(&self.pool, movie_id).await?;
        let total_pages = if total_items == 0 {
            0
        } else {
            page.ensure_in_range(total_items)?
        };

        let roots = comment_repo::list_roots(
            &self.pool,
            movie_id,
            viewer_id,
            page.per_page,
            page.offset()?,
        )
        .await?;
        let root_ids: Vec<i64> = roots.iter().map(|r| r.id).collect();
        let descendants = comment_repo::list_descendants(&self.pool, &root_ids, viewer_id).await?;

        Ok(CommentListResponse {
            comments: build_comment_forest(roots, descendants),
            page: page.page,
            per_page: page.per_page,
            total_pages,
            total_items,
        })
    }

    pub async fn get(&self, viewer_id: i64, movie_id: i64, comment_id: i64) -> Result<CommentNode> {
        let row = comment_repo::find_row(&self.pool, movie_id, comment_id, viewer_id)
            .await?
            .ok_or_else(comment_not_found)?;
        let descendants =
            comment_repo::list_descendants(&self.pool, &[row.id], viewer_id).await?;
        build_comment_forest(vec![row], descendants)
            .pop()
            .ok_or_else(comment_not_found)
    }

    pub async fn update(
        &self,
        actor: &AuthUser,
        movie_id: i64,
        comment_id: i64,
        req: UpdateCommentRequest,
    ) -> Result<Comment> {
        req.validate()?;
        let comment = comment_repo::find_in_movie(&self.pool, movie_id, comment_id)
            .await?
            .ok_or_else(comment_not_found)?;
        check_comment_edit(actor.id, comment.user_id)?;

        Ok(comment_repo::update_content(&self.pool, comment.id, &req.content).await?)
    }

    /// Direct replies survive with `parent_id` cleared by the foreign key
    pub async fn delete(&self, actor: &AuthUser, movie_id: i64, comment_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if !movie_repo::lock_movie(&mut tx, movie_id).await? {
            return Err(movie_not_found());
        }
        let comment = comment_repo::find_in_movie(&mut *tx, movie_id, comment_id)
            .await?
            .ok_or_else(comment_not_found)?;
        check_comment_delete(actor.id, actor.role, comment.user_id)?;

        comment_repo::delete_comment(&mut *tx, comment.id).await?;
        movie_repo::adjust_counter(&mut *tx, movie_id, Counter::Comment, -1).await?;
        tx.commit().await?;

        info!(comment_id, movie_id, actor_id = actor.id, "comment deleted");
        Ok(())
    }

    pub async fn like(&self, actor: &AuthUser, comment_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let comment = comment_repo::find_comment(&mut *tx, comment_id)
            .await?
            .ok_or_else(comment_not_found)?;
        if !comment_repo::add_like(&mut *tx, actor.id, comment.id).await? {
            return Err(AppError::BadRequest(
                "You already liked this comment.".into(),
            ));
        }

        let notify = comment.user_id != actor.id;
        if notify {
            notification_repo::create_notification(
                &mut *tx,
                comment.user_id,
                NotificationKind::CommentLike,
                comment.id,
                &format!("{} liked your comment.", actor.email),
            )
            .await?;
        }
        tx.commit().await?;

        if notify {
            if let Some(recipient) = user_repo::find_by_id(&self.pool, comment.user_id).await? {
                self.tasks
                    .dispatch(Task::SendCommentLikeEmail {
                        email: recipient.email,
                        comment_preview: preview(&comment.content, PREVIEW_CHARS),
                        comment_link: self.links.comment(comment.movie_id, comment.id),
                    })
                    .await;
            }
        }
        Ok(())
    }

    pub async fn unlike(&self, actor: &AuthUser, comment_id: i64) -> Result<()> {
        if !comment_repo::remove_like(&self.pool, actor.id, comment_id).await? {
            return Err(AppError::NotFound(
                "You have not liked this comment.".into(),
            ));
        }
        Ok(())
    }

    pub async fn notifications(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        Ok(notification_repo::list_for_user(&self.pool, user_id, unread_only).await?)
    }

    pub async fn mark_notification_read(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<Notification> {
        notification_repo::mark_read(&self.pool, notification_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found.".into()))
    }
}

/// Role and ownership checks
use crate::error::{AppError, Result};
use crate::models::Role;

fn role_rank(role: Role) -> u8 {
    match role {
        Role::User => 0,
        Role::Moderator => 1,
        Role::Admin => 2,
    }
}

/// Allow when `role` is at least `required`
pub fn authorize(role: Role, required: Role) -> Result<()> {
    if role_rank(role) >= role_rank(required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ))
    }
}

/// Owner of a user-scoped resource, or any moderator/admin
pub fn check_owner_or_staff(actor_id: i64, actor_role: Role, owner_id: i64) -> Result<()> {
    if actor_id == owner_id {
        return Ok(());
    }
    authorize(actor_role, Role::Moderator)
}

/// Only the author may edit a comment
pub fn check_comment_edit(actor_id: i64, author_id: i64) -> Result<()> {
    if actor_id == author_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to modify this comment.".to_string(),
        ))
    }
}

/// The author or any moderator/admin may delete a comment
pub fn check_comment_delete(actor_id: i64, actor_role: Role, author_id: i64) -> Result<()> {
    check_owner_or_staff(actor_id, actor_role, author_id).map_err(|_| {
        AppError::Forbidden("Not authorized to delete this comment.".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_ordered() {
        assert!(authorize(Role::Admin, Role::Moderator).is_ok());
        assert!(authorize(Role::Moderator, Role::Moderator).is_ok());
        assert!(authorize(Role::User, Role::User).is_ok());
        assert!(matches!(
            authorize(Role::User, Role::Moderator),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize(Role::Moderator, Role::Admin).is_err());
    }

    #[test]
    fn staff_can_act_on_other_users() {
        assert!(check_owner_or_staff(1, Role::User, 1).is_ok());
        assert!(check_owner_or_staff(1, Role::User, 2).is_err());
        assert!(check_owner_or_staff(1, Role::Moderator, 2).is_ok());
    }

    #[test]
    fn only_author_edits_but_staff_may_delete() {
        assert!(check_comment_edit(7, 7).is_ok());
        let err = check_comment_edit(8, 7).unwrap_err();
        assert_eq!(err.message(), "Not authorized to modify this comment.");
        assert!(check_comment_delete(8, Role::Admin, 7).is_ok());
        assert!(check_comment_delete(8, Role::User, 7).is_err());
    }
}

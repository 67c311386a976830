use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Role, UserProfile};
use crate::utils::now_rfc3339;

/// A definite, non-empty acting identity. The only supported way to obtain
/// one is from an identifier the caller passes explicitly out of its own live
/// session; re-deriving the identity inside the persistence boundary from
/// ambient session state is intentionally unsupported, it raced with session
/// hydration and yielded null identities for logged-in users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    uid: String,
}

impl ActingUser {
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

pub fn resolve_acting_user(explicit_uid: Option<&str>) -> Result<ActingUser> {
    match explicit_uid {
        Some(uid) if !uid.trim().is_empty() => Ok(ActingUser {
            uid: uid.trim().to_string(),
        }),
        _ => Err(Error::NotAuthenticated),
    }
}

/// Read the acting user's profile, creating it on first authenticated access.
/// A lazily created profile always gets the standard role; promotion to admin
/// happens only through the external access-control surface.
pub fn ensure_profile(db: &Database, user: &ActingUser, email: &str) -> Result<UserProfile> {
    if let Some(profile) = db.get_user(user.uid())? {
        return Ok(profile);
    }

    let profile = UserProfile {
        uid: user.uid().to_string(),
        email: email.to_string(),
        role: Role::Standard,
        created_at: now_rfc3339(),
    };
    db.insert_user(&profile)?;
    info!(uid = %profile.uid, "created user profile");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_identifier_is_trusted() {
        let user = resolve_acting_user(Some("user-123")).unwrap();
        assert_eq!(user.uid(), "user-123");
    }

    #[test]
    fn absent_or_empty_identity_is_a_definite_failure() {
        assert!(matches!(
            resolve_acting_user(None),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            resolve_acting_user(Some("")),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            resolve_acting_user(Some("   ")),
            Err(Error::NotAuthenticated)
        ));
    }

    #[test]
    fn profile_is_created_lazily_with_standard_role() {
        let db = Database::new_in_memory().unwrap();
        let user = resolve_acting_user(Some("user-1")).unwrap();

        let created = ensure_profile(&db, &user, "user@example.com").unwrap();
        assert_eq!(created.role, Role::Standard);

        // Second access reads the same profile instead of recreating it.
        let read = ensure_profile(&db, &user, "other@example.com").unwrap();
        assert_eq!(read.email, "user@example.com");
        assert_eq!(read.created_at, created.created_at);
    }
}

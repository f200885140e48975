use uuid::Uuid;

use crate::{
    auth::{AuthUser, Caller},
    error::ApiError,
    models::{ItemStatus, Role},
};

// Error details mirror the wording clients already match on.
const DETAIL_CREATE_AUTH: &str = "Authentication required to create timeline items.";
const DETAIL_CREATE_ROLE: &str = "Only instructors, managers or admins can create timeline items.";
const DETAIL_PUBLISH_ROLE: &str = "Only admin or manager can publish a post.";

/// RoleFlags
///
/// The three mutually-independent boolean facts the engine runs on, computed
/// once per operation from the caller's stored role string and superuser flag.
///
/// Classification is total: an unknown or malformed role string parses to no
/// role at all, leaving every flag false — the caller is under-privileged to
/// the safest outcome rather than the request failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleFlags {
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_instructor: bool,
}

impl RoleFlags {
    pub fn for_user(user: &AuthUser) -> Self {
        let role = Role::parse(&user.role);
        RoleFlags {
            is_admin: user.is_superuser || role == Some(Role::Admin),
            is_manager: role == Some(Role::Manager),
            is_instructor: role == Some(Role::Instructor),
        }
    }

    /// Publish rights: admin (incl. superuser) or manager.
    pub fn can_publish(&self) -> bool {
        self.is_admin || self.is_manager
    }

    /// Create rights: any of the three recognized roles.
    pub fn can_create(&self) -> bool {
        self.is_admin || self.is_manager || self.is_instructor
    }
}

/// VisibilityScope
///
/// The record subset a caller may observe. Compiled into the SQL WHERE clause
/// by the repository, so LIST and single-item GET apply the exact same filter
/// and an out-of-scope id simply is not present (NotFound, never Forbidden).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Published items only.
    Published,
    /// Every item, unfiltered.
    All,
    /// Published items plus the caller's own drafts.
    PublishedOrAuthored(Uuid),
}

/// Computes the caller's visibility scope. First matching rule wins:
/// anonymous → published only; admin/manager → everything; instructor
/// (incl. legacy writer) → published plus own; any other authenticated
/// role → published only.
pub fn visibility_scope(caller: &Caller) -> VisibilityScope {
    match caller {
        Caller::Anonymous => VisibilityScope::Published,
        Caller::User(user) => {
            let flags = RoleFlags::for_user(user);
            if flags.is_admin || flags.is_manager {
                VisibilityScope::All
            } else if flags.is_instructor {
                VisibilityScope::PublishedOrAuthored(user.id)
            } else {
                VisibilityScope::Published
            }
        }
    }
}

/// Create gate: authentication first (Unauthorized), then the role gate
/// (Forbidden). Returns the authenticated author on success.
pub fn authorize_create(caller: &Caller) -> Result<&AuthUser, ApiError> {
    let user = match caller {
        Caller::Anonymous => return Err(ApiError::Unauthorized(DETAIL_CREATE_AUTH)),
        Caller::User(user) => user,
    };
    if !RoleFlags::for_user(user).can_create() {
        return Err(ApiError::Forbidden(DETAIL_CREATE_ROLE));
    }
    Ok(user)
}

/// Initial publish decision at creation: the item is persisted as DRAFT
/// regardless; it transitions to PUBLISHED only when the raw request asked for
/// it *and* the author holds publish rights. An instructor's publish wish is
/// silently downgraded, never rejected.
pub fn publish_on_create(author: &AuthUser, requested: Option<ItemStatus>) -> bool {
    requested == Some(ItemStatus::Published) && RoleFlags::for_user(author).can_publish()
}

/// Update-path publish gate. Fires on the *requested* value, so re-sending
/// PUBLISHED for an already-published item is still Forbidden for callers
/// without publish rights. DRAFT requests pass through unchecked, including
/// the unguarded PUBLISHED→DRAFT overwrite.
pub fn authorize_status_request(user: &AuthUser, requested: ItemStatus) -> Result<(), ApiError> {
    if requested == ItemStatus::Published && !RoleFlags::for_user(user).can_publish() {
        return Err(ApiError::Forbidden(DETAIL_PUBLISH_ROLE));
    }
    Ok(())
}

/// Whether this update must perform the DRAFT→PUBLISHED transition (stamping
/// `published_at`). Already-published items are left alone, which makes a
/// repeated publish request idempotent on the timestamp.
pub fn publish_transition(current: ItemStatus, requested: ItemStatus) -> bool {
    requested == ItemStatus::Published && current != ItemStatus::Published
}

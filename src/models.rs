use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of roles governing default authorization. Storage keeps the
/// role as free text (legacy databases contain values outside this set), so
/// parsing is the single point where raw role strings enter typed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Instructor,
}

impl Role {
    /// Parses a stored role value. Unknown or malformed values yield `None`,
    /// which classifies the caller to the most restrictive outcome everywhere
    /// downstream. The legacy "writer" role is accepted as instructor-equivalent.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "MANAGER" => Some(Role::Manager),
            "INSTRUCTOR" | "WRITER" => Some(Role::Instructor),
            _ => None,
        }
    }
}

/// ItemStatus
///
/// The two lifecycle states of a timeline item. Stored as uppercase text in
/// the `status` column; DRAFT is the storage-level default for new rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum ItemStatus {
    #[default]
    Draft,
    Published,
}

/// User
///
/// The caller's canonical identity record stored in the `public.profiles` table.
/// This is the minimal data resolved during authentication: the id, the display
/// name, the RBAC role string, and the orthogonal superuser flag.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    // The RBAC field: 'ADMIN', 'MANAGER' or 'INSTRUCTOR' (legacy rows may hold 'WRITER').
    pub role: String,
    // Elevated flag treated as admin-equivalent regardless of `role`.
    pub is_superuser: bool,
}

/// TimelineItem
///
/// A timeline post row from `public.timeline_items`, joined with the author's
/// profile so a single query yields everything the response needs.
///
/// `published_at` is stamped exactly once, the first time the item becomes
/// PUBLISHED; a later status overwrite back to DRAFT leaves it in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct TimelineItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    // FK to public.profiles.id. Set once at creation, never reassigned.
    pub author_id: Uuid,
    // Loaded via the JOIN with `profiles` in every repository query.
    #[sqlx(default)]
    pub author_username: String,
    #[sqlx(default)]
    pub author_role: String,
    pub status: ItemStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
}

/// --- Request Payloads (Input Schemas) ---

/// CreateTimelineItemRequest
///
/// Input payload for POST /items. The `status` field is the caller's publish
/// wish: it never fails the request, it is only honored for admin/manager
/// callers and silently ignored otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTimelineItemRequest {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

/// UpdateTimelineItemRequest
///
/// Partial update payload for PUT/PATCH /items/{id}. All fields are `Option<T>`
/// so only provided fields are written (COALESCE semantics in the repository).
/// `author`, `created_at` and `published_at` are not caller-writable and have
/// no corresponding fields here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTimelineItemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

/// --- Output Schemas ---

/// AuthorSummary
///
/// The embedded author object on every returned item: `{id, username, role}`.
/// The role is echoed as stored, not normalized, so legacy values stay visible
/// to clients that still rely on them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

/// TimelineItemResponse
///
/// The wire shape of a timeline item. Everything except `title`/`content`/`status`
/// is read-only from the caller's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TimelineItemResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    pub status: ItemStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
}

impl From<TimelineItem> for TimelineItemResponse {
    fn from(item: TimelineItem) -> Self {
        TimelineItemResponse {
            id: item.id,
            title: item.title,
            content: item.content,
            author: AuthorSummary {
                id: item.author_id,
                username: item.author_username,
                role: item.author_role,
            },
            status: item.status,
            created_at: item.created_at,
            updated_at: item.updated_at,
            published_at: item.published_at,
        }
    }
}

/// UserProfile
///
/// Output schema for the authenticated user's own profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub is_superuser: bool,
}

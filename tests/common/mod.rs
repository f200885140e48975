#![allow(dead_code)]

use async_trait::async_trait;
use brightpath_timeline::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    engine::VisibilityScope,
    models::{
        CreateTimelineItemRequest, ItemStatus, TimelineItem, UpdateTimelineItemRequest, User,
    },
    repository::{Repository, RepositoryState},
};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- In-Memory Repository ---

// Stateful test double for the Repository trait. Implements the same scope
// filtering, ordering, and two-step publish semantics as the Postgres
// implementation, so handler behavior can be exercised end-to-end without a
// database.
#[derive(Default)]
pub struct MemoryRepo {
    pub items: Mutex<Vec<TimelineItem>>,
    pub users: Mutex<HashMap<Uuid, User>>,
}

fn in_scope(item: &TimelineItem, scope: &VisibilityScope) -> bool {
    match scope {
        VisibilityScope::Published => item.status == ItemStatus::Published,
        VisibilityScope::All => true,
        VisibilityScope::PublishedOrAuthored(author_id) => {
            item.status == ItemStatus::Published || item.author_id == *author_id
        }
    }
}

// published_at DESC NULLS LAST, created_at DESC
fn listing_order(a: &TimelineItem, b: &TimelineItem) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| b.created_at.cmp(&a.created_at)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    }
}

#[async_trait]
impl Repository for MemoryRepo {
    async fn list_items(&self, scope: VisibilityScope) -> Vec<TimelineItem> {
        let mut items: Vec<TimelineItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| in_scope(item, &scope))
            .cloned()
            .collect();
        items.sort_by(listing_order);
        items
    }

    async fn get_item(&self, id: Uuid, scope: VisibilityScope) -> Option<TimelineItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == id && in_scope(item, &scope))
            .cloned()
    }

    async fn create_item(
        &self,
        author_id: Uuid,
        req: CreateTimelineItemRequest,
        publish: bool,
    ) -> Option<TimelineItem> {
        let author = self
            .users
            .lock()
            .unwrap()
            .get(&author_id)
            .cloned()
            .unwrap_or_default();

        let now = Utc::now();
        let mut item = TimelineItem {
            id: Uuid::new_v4(),
            title: req.title,
            content: req.content,
            author_id,
            author_username: author.username,
            author_role: author.role,
            status: ItemStatus::Draft,
            created_at: now,
            updated_at: now,
            published_at: None,
        };
        if publish {
            item.status = ItemStatus::Published;
            item.published_at = Some(now);
        }

        self.items.lock().unwrap().push(item.clone());
        Some(item)
    }

    async fn update_item(
        &self,
        id: Uuid,
        scope: VisibilityScope,
        req: UpdateTimelineItemRequest,
        publish: bool,
    ) -> Option<TimelineItem> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|item| item.id == id && in_scope(item, &scope))?;

        let now = Utc::now();
        if publish && item.status != ItemStatus::Published {
            item.status = ItemStatus::Published;
            item.published_at = Some(now);
        }
        if let Some(title) = req.title {
            item.title = title;
        }
        if let Some(content) = req.content {
            item.content = content;
        }
        if let Some(status) = req.status {
            item.status = status;
        }
        item.updated_at = now;

        Some(item.clone())
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }
}

// --- Test Utilities ---

// Registers a profile and returns it.
pub fn seed_user(repo: &MemoryRepo, username: &str, role: &str, is_superuser: bool) -> User {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        role: role.to_string(),
        is_superuser,
    };
    repo.users.lock().unwrap().insert(user.id, user.clone());
    user
}

pub fn auth_user(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
        is_superuser: user.is_superuser,
    }
}

// Creates an AppState over a shared MemoryRepo.
pub fn test_state(repo: Arc<MemoryRepo>) -> AppState {
    AppState {
        repo: repo as RepositoryState,
        config: AppConfig::default(),
    }
}

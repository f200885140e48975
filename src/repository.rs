use crate::engine::VisibilityScope;
use crate::models::{CreateTimelineItemRequest, ItemStatus, TimelineItem, UpdateTimelineItemRequest, User};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations, allowing handlers to
/// interact with the data layer without knowing the concrete implementation
/// (Postgres, in-memory test double, etc.).
///
/// Every read takes the caller's `VisibilityScope` so the same filter applies
/// to listings and single-item fetches alike; an id outside the scope behaves
/// exactly like an absent row.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Lists visible items, newest published first, drafts trailing by recency.
    async fn list_items(&self, scope: VisibilityScope) -> Vec<TimelineItem>;

    /// Fetches a single item within the caller's visibility scope.
    async fn get_item(&self, id: Uuid, scope: VisibilityScope) -> Option<TimelineItem>;

    /// Inserts a new DRAFT item for `author_id` and, when `publish` is set,
    /// transitions it to PUBLISHED stamping `published_at`. Both writes run in
    /// one transaction. Returns None on a data-layer fault.
    async fn create_item(
        &self,
        author_id: Uuid,
        req: CreateTimelineItemRequest,
        publish: bool,
    ) -> Option<TimelineItem>;

    /// Applies a partial update to an item inside the caller's scope. When
    /// `publish` is set, the DRAFT→PUBLISHED stamp is written before the
    /// generic field update, all in one transaction with the row locked.
    /// Returns None when the item is outside the scope (or gone).
    async fn update_item(
        &self,
        id: Uuid,
        scope: VisibilityScope,
        req: UpdateTimelineItemRequest,
        publish: bool,
    ) -> Option<TimelineItem>;

    /// Retrieves the profile data needed for authentication and authorization.
    async fn get_user(&self, id: Uuid) -> Option<User>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Shared projection: every item query joins the author's profile so a single
// round trip yields the full wire shape.
const SELECT_ITEM: &str = r#"
    SELECT i.id, i.title, i.content, i.author_id,
           u.username AS author_username, u.role AS author_role,
           i.status, i.created_at, i.updated_at, i.published_at
    FROM timeline_items i
    JOIN profiles u ON i.author_id = u.id
"#;

const ORDER_ITEMS: &str = " ORDER BY i.published_at DESC NULLS LAST, i.created_at DESC";

/// Appends the SQL predicate for a visibility scope. Parameterized via
/// push_bind throughout, so no injection surface.
fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &VisibilityScope) {
    match scope {
        VisibilityScope::Published => {
            builder.push("i.status = ");
            builder.push_bind(ItemStatus::Published);
        }
        VisibilityScope::All => {
            builder.push("TRUE");
        }
        VisibilityScope::PublishedOrAuthored(author_id) => {
            builder.push("(i.status = ");
            builder.push_bind(ItemStatus::Published);
            builder.push(" OR i.author_id = ");
            builder.push_bind(*author_id);
            builder.push(")");
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_items
    ///
    /// The visibility scope is compiled into the WHERE clause so filtering
    /// happens in the database, never in application code after the fact.
    async fn list_items(&self, scope: VisibilityScope) -> Vec<TimelineItem> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_ITEM);
        builder.push(" WHERE ");
        push_scope(&mut builder, &scope);
        builder.push(ORDER_ITEMS);

        match builder.build_query_as::<TimelineItem>().fetch_all(&self.pool).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("list_items error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_item
    ///
    /// Same projection and same scope predicate as the listing; an item the
    /// caller may not see is indistinguishable from one that does not exist.
    async fn get_item(&self, id: Uuid, scope: VisibilityScope) -> Option<TimelineItem> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_ITEM);
        builder.push(" WHERE i.id = ");
        builder.push_bind(id);
        builder.push(" AND ");
        push_scope(&mut builder, &scope);

        builder
            .build_query_as::<TimelineItem>()
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_item error: {:?}", e);
                None
            })
    }

    /// create_item
    ///
    /// Two-step create: the row lands as DRAFT (the storage-level default for
    /// `status`), then the publish transition is applied when authorized. The
    /// transition is a separate statement so it stamps `published_at`
    /// identically whether triggered here or via a later update, and the whole
    /// sequence commits atomically.
    async fn create_item(
        &self,
        author_id: Uuid,
        req: CreateTimelineItemRequest,
        publish: bool,
    ) -> Option<TimelineItem> {
        let result = async {
            let mut tx = self.pool.begin().await?;

            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO timeline_items (id, author_id, title, content) VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(author_id)
            .bind(&req.title)
            .bind(&req.content)
            .execute(&mut *tx)
            .await?;

            if publish {
                sqlx::query(
                    "UPDATE timeline_items SET status = $2, published_at = NOW(), updated_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .bind(ItemStatus::Published)
                .execute(&mut *tx)
                .await?;
            }

            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_ITEM);
            builder.push(" WHERE i.id = ");
            builder.push_bind(id);
            let item = builder
                .build_query_as::<TimelineItem>()
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(item)
        }
        .await;

        match result {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::error!("create_item error: {:?}", e);
                None
            }
        }
    }

    /// update_item
    ///
    /// Locks the row within the caller's scope (`SELECT ... FOR UPDATE`), then
    /// applies the publish stamp ahead of the generic COALESCE update. The row
    /// lock serializes concurrent publishes of the same item, so
    /// `published_at` is written at most once.
    ///
    /// `published_at` is deliberately absent from the generic update: a status
    /// overwrite back to DRAFT leaves the stamp in place.
    async fn update_item(
        &self,
        id: Uuid,
        scope: VisibilityScope,
        req: UpdateTimelineItemRequest,
        publish: bool,
    ) -> Option<TimelineItem> {
        let result = async {
            let mut tx = self.pool.begin().await?;

            let mut lock: QueryBuilder<Postgres> =
                QueryBuilder::new("SELECT i.id FROM timeline_items i WHERE i.id = ");
            lock.push_bind(id);
            lock.push(" AND ");
            push_scope(&mut lock, &scope);
            lock.push(" FOR UPDATE");
            if lock.build().fetch_optional(&mut *tx).await?.is_none() {
                return Ok::<_, sqlx::Error>(None);
            }

            if publish {
                // Guarded on the current status as well: a concurrent publish
                // that slipped in first must not re-stamp the timestamp.
                sqlx::query(
                    "UPDATE timeline_items SET status = $2, published_at = NOW(), updated_at = NOW() WHERE id = $1 AND status <> $2",
                )
                .bind(id)
                .bind(ItemStatus::Published)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query(
                r#"
                UPDATE timeline_items
                SET title = COALESCE($2, title),
                    content = COALESCE($3, content),
                    status = COALESCE($4, status),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(req.title)
            .bind(req.content)
            .bind(req.status)
            .execute(&mut *tx)
            .await?;

            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_ITEM);
            builder.push(" WHERE i.id = ");
            builder.push_bind(id);
            let item = builder
                .build_query_as::<TimelineItem>()
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(Some(item))
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!("update_item error: {:?}", e);
            None
        })
    }

    /// get_user
    ///
    /// Profile lookup backing the auth extractor.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, role, is_superuser FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }
}

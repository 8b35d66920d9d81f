//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::UserRepository;
use quill_core::service::{ContentService, InteractionService};
use quill_infra::database::InMemoryStore;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    pub interactions: Arc<InteractionService>,
    pub users: Arc<dyn UserRepository>,
    pub media_base_url: String,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = config.database.as_ref() {
                match quill_infra::database::connect(db_config).await {
                    Ok(conn) => return Self::with_postgres(conn, config),
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        Self::with_memory(config)
    }

    #[cfg(feature = "postgres")]
    fn with_postgres(conn: quill_infra::database::DbConn, config: &AppConfig) -> Self {
        use quill_infra::database::{
            PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
            PostgresUserRepository,
        };

        let categories = Arc::new(PostgresCategoryRepository::new(conn.clone()));
        let posts = Arc::new(PostgresPostRepository::new(conn.clone()));
        let comments = Arc::new(PostgresCommentRepository::new(conn.clone()));
        let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(conn));

        tracing::info!("Application state initialized (postgres)");

        Self {
            content: Arc::new(ContentService::new(categories, posts.clone(), comments)),
            interactions: Arc::new(InteractionService::new(posts)),
            users,
            media_base_url: config.media_base_url.clone(),
        }
    }

    fn with_memory(config: &AppConfig) -> Self {
        let store = InMemoryStore::new();

        tracing::info!("Application state initialized (in-memory)");

        Self {
            content: Arc::new(ContentService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store.clone()),
            )),
            interactions: Arc::new(InteractionService::new(Arc::new(store.clone()))),
            users: Arc::new(store),
            media_base_url: config.media_base_url.clone(),
        }
    }
}

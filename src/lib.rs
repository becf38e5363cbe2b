pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod workflow;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StoreBackend};
use crate::database::job_store::JobStore;
use crate::database::memory_store::MemoryJobStore;
use crate::database::pg_store::PgJobStore;
use crate::database::pool::{create_pool, run_migrations};
use crate::error::Result;
use crate::services::{
    document_service::{DocumentRenderer, HttpDocumentRenderer, JsonDocumentRenderer},
    file_storage_service::FileStorageService,
    job_service::JobService,
    notification_service::NotificationService,
    worklist_service::WorklistService,
};
use reqwest::Client;

/// Server knobs that handlers and middleware read from the state.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub jwt_secret: String,
    pub api_rps: u32,
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub job_service: JobService,
    pub worklist_service: WorklistService,
    pub files: FileStorageService,
    pub jwt_secret: Arc<str>,
    pub api_rps: u32,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_parts(
        store: Arc<dyn JobStore>,
        files: FileStorageService,
        renderer: Arc<dyn DocumentRenderer>,
        notifier: NotificationService,
        settings: ServerSettings,
    ) -> Self {
        let job_service = JobService::new(store.clone(), files.clone(), renderer, notifier);
        let worklist_service = WorklistService::new(store);
        Self {
            job_service,
            worklist_service,
            files,
            jwt_secret: Arc::from(settings.jwt_secret),
            api_rps: settings.api_rps,
            max_upload_bytes: settings.max_upload_bytes,
        }
    }

    /// Wires the configured store and collaborators. For the postgres store
    /// this connects and runs pending migrations.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let store: Arc<dyn JobStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let pool = create_pool(config.database_url.as_deref()).await?;
                run_migrations(&pool).await?;
                Arc::new(PgJobStore::new(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory job store; data is lost on restart");
                Arc::new(MemoryJobStore::new())
            }
        };

        let renderer: Arc<dyn DocumentRenderer> = match &config.document_renderer_url {
            Some(url) => Arc::new(HttpDocumentRenderer::new(http_client.clone(), url.clone())),
            None => Arc::new(JsonDocumentRenderer),
        };
        let notifier = NotificationService::new(http_client, config.notify_webhook_url.clone());
        let files = FileStorageService::new(&config.uploads_dir);

        Ok(Self::from_parts(
            store,
            files,
            renderer,
            notifier,
            ServerSettings {
                jwt_secret: config.jwt_secret.clone(),
                api_rps: config.api_rps,
                max_upload_bytes: config.max_upload_mb * 1024 * 1024,
            },
        ))
    }
}

use crate::builder::GraphBuilder;
use chrono::Utc;
use dashmap::DashMap;
use graphcheck_core::{
    GraphStore, IngestResult, NamespaceMeta, ParsedModule, RepositoryIdentity, Result, SkippedFile,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::info;

/// Writes parsed repositories into the store. One writer per namespace at a
/// time; ingests of different repositories proceed concurrently.
pub struct RepositoryIngestor {
    store: Arc<dyn GraphStore>,
    namespace_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RepositoryIngestor {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            namespace_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> Arc<dyn GraphStore> {
        Arc::clone(&self.store)
    }

    /// Replace the repository's subtree with the parse result. Stale nodes
    /// are deleted before the upsert so a rename lands as delete + create in
    /// the same pass. Re-running on unchanged source is a zero-diff no-op.
    pub async fn ingest(
        &self,
        repository: &RepositoryIdentity,
        modules: &[ParsedModule],
        files_skipped: Vec<SkippedFile>,
    ) -> Result<IngestResult> {
        let lock = self
            .namespace_locks
            .entry(repository.name.clone())
            .or_default()
            .clone();
        let _guard = lock.lock().await;
        let started = Instant::now();

        let nodes = GraphBuilder::build(repository, modules);
        let node_count = nodes.len();
        let keep: HashSet<String> = nodes.iter().map(|n| n.qualified_name.clone()).collect();

        let deleted = self.store.delete_absent(&repository.name, &keep).await?;
        let outcome = self.store.upsert_nodes(&repository.name, nodes).await?;

        self.store
            .put_namespace_meta(NamespaceMeta {
                repository: repository.name.clone(),
                source_location: repository.source_location.clone(),
                ingested_at: Utc::now(),
                file_count: modules.len(),
                node_count,
            })
            .await?;

        info!(
            "Ingested '{}': {} files, +{} ~{} -{} nodes in {:.2}s",
            repository.name,
            modules.len(),
            outcome.created,
            outcome.updated,
            deleted,
            started.elapsed().as_secs_f64()
        );

        Ok(IngestResult {
            repository: repository.name.clone(),
            nodes_created: outcome.created,
            nodes_updated: outcome.updated,
            nodes_deleted: deleted,
            files_parsed: modules.len(),
            files_skipped,
        })
    }
}

use async_trait::async_trait;
use graphcheck_core::{
    EdgeKind, FunctionSignature, GraphCheckError, GraphNode, GraphStore, NamespaceMeta, Result,
    SymbolKind, UpsertOutcome,
};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompressionType, DBWithThreadMode, Direction,
    IteratorMode, MultiThreaded, Options, WriteBatch,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

type Db = DBWithThreadMode<MultiThreaded>;

const NODES_CF: &str = "nodes";
const CHILDREN_CF: &str = "children";
const NAMES_CF: &str = "names";
const META_CF: &str = "meta";

/// Key separator. Cannot occur in namespaces or qualified names, so one
/// prefix scan covers exactly one namespace (or one parent, or one name).
const KEY_SEP: u8 = 0x1f;

/// On-disk form of a graph node. Kept separate from the in-memory type so
/// the storage schema can evolve independently.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct StoredNode {
    qualified_name: String,
    name: String,
    kind: SymbolKind,
    parent: Option<String>,
    parent_edge: Option<EdgeKind>,
    file_path: Option<String>,
    line: Option<u32>,
    signature: Option<FunctionSignature>,
    bases: Vec<String>,
    type_annotation: Option<String>,
}

impl From<GraphNode> for StoredNode {
    fn from(node: GraphNode) -> Self {
        Self {
            qualified_name: node.qualified_name,
            name: node.name,
            kind: node.kind,
            parent: node.parent,
            parent_edge: node.parent_edge,
            file_path: node.file_path,
            line: node.line,
            signature: node.signature,
            bases: node.bases,
            type_annotation: node.type_annotation,
        }
    }
}

impl From<StoredNode> for GraphNode {
    fn from(node: StoredNode) -> Self {
        Self {
            qualified_name: node.qualified_name,
            name: node.name,
            kind: node.kind,
            parent: node.parent,
            parent_edge: node.parent_edge,
            file_path: node.file_path,
            line: node.line,
            signature: node.signature,
            bases: node.bases,
            type_annotation: node.type_annotation,
        }
    }
}

/// On-disk namespace metadata; the timestamp is stored as epoch millis.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct StoredMeta {
    repository: String,
    source_location: String,
    ingested_at_ms: i64,
    file_count: usize,
    node_count: usize,
}

impl From<NamespaceMeta> for StoredMeta {
    fn from(meta: NamespaceMeta) -> Self {
        Self {
            repository: meta.repository,
            source_location: meta.source_location,
            ingested_at_ms: meta.ingested_at.timestamp_millis(),
            file_count: meta.file_count,
            node_count: meta.node_count,
        }
    }
}

impl From<StoredMeta> for NamespaceMeta {
    fn from(meta: StoredMeta) -> Self {
        Self {
            repository: meta.repository,
            source_location: meta.source_location,
            ingested_at: chrono::DateTime::from_timestamp_millis(meta.ingested_at_ms)
                .unwrap_or(chrono::DateTime::UNIX_EPOCH),
            file_count: meta.file_count,
            node_count: meta.node_count,
        }
    }
}

/// RocksDB-backed store. Four column families: node payloads, a children
/// index, a simple-name index, and per-namespace metadata.
pub struct RocksDbGraphStore {
    db: Arc<Db>,
    db_path: PathBuf,
}

impl RocksDbGraphStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(num_cpus::get() as i32);
        db_opts.set_compression_type(DBCompressionType::Zstd);
        db_opts.set_bytes_per_sync(1024 * 1024);

        let cf_descriptors = vec![
            Self::cf_descriptor(NODES_CF, 64 * 1024 * 1024),
            Self::cf_descriptor(CHILDREN_CF, 32 * 1024 * 1024),
            Self::cf_descriptor(NAMES_CF, 32 * 1024 * 1024),
            Self::cf_descriptor(META_CF, 8 * 1024 * 1024),
        ];

        let db = Db::open_cf_descriptors(&db_opts, &path, cf_descriptors)
            .map_err(|e| GraphCheckError::GraphWrite(format!("failed to open database: {}", e)))?;

        Ok(Self {
            db: Arc::new(db),
            db_path: path.as_ref().to_path_buf(),
        })
    }

    fn cf_descriptor(name: &str, write_buffer: usize) -> ColumnFamilyDescriptor {
        let mut opts = Options::default();
        opts.set_write_buffer_size(write_buffer);
        opts.set_compression_type(DBCompressionType::Zstd);
        ColumnFamilyDescriptor::new(name, opts)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| GraphCheckError::GraphWrite(format!("column family '{}' missing", name)))
    }

    fn node_key(namespace: &str, qualified_name: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(namespace.len() + qualified_name.len() + 1);
        key.extend_from_slice(namespace.as_bytes());
        key.push(KEY_SEP);
        key.extend_from_slice(qualified_name.as_bytes());
        key
    }

    /// `namespace SEP bucket SEP qualified_name`, used by both indexes with
    /// the parent (children CF) or the simple name (names CF) as bucket.
    fn index_key(namespace: &str, bucket: &str, qualified_name: &str) -> Vec<u8> {
        let mut key =
            Vec::with_capacity(namespace.len() + bucket.len() + qualified_name.len() + 2);
        key.extend_from_slice(namespace.as_bytes());
        key.push(KEY_SEP);
        key.extend_from_slice(bucket.as_bytes());
        key.push(KEY_SEP);
        key.extend_from_slice(qualified_name.as_bytes());
        key
    }

    fn scan_prefix(parts: &[&str]) -> Vec<u8> {
        let mut prefix = Vec::new();
        for part in parts {
            prefix.extend_from_slice(part.as_bytes());
            prefix.push(KEY_SEP);
        }
        prefix
    }

    /// Keys under `prefix`, with the prefix stripped from each.
    fn scan_suffixes(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<String>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));
        let mut suffixes = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            suffixes.push(String::from_utf8_lossy(&key[prefix.len()..]).to_string());
        }
        Ok(suffixes)
    }

    fn get_node(&self, namespace: &str, qualified_name: &str) -> Result<Option<GraphNode>> {
        let cf = self.cf(NODES_CF)?;
        let raw = self
            .db
            .get_cf(&cf, Self::node_key(namespace, qualified_name))
            .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
        match raw {
            Some(bytes) => {
                let stored: StoredNode = bincode::deserialize(&bytes)
                    .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
                Ok(Some(stored.into()))
            }
            None => Ok(None),
        }
    }

    fn upsert_sync(&self, namespace: &str, nodes: Vec<GraphNode>) -> Result<UpsertOutcome> {
        let nodes_cf = self.cf(NODES_CF)?;
        let children_cf = self.cf(CHILDREN_CF)?;
        let names_cf = self.cf(NAMES_CF)?;

        let mut batch = WriteBatch::default();
        let mut outcome = UpsertOutcome::default();

        for node in nodes {
            let key = Self::node_key(namespace, &node.qualified_name);
            let stored = StoredNode::from(node);
            let bytes = bincode::serialize(&stored)
                .map_err(|e| GraphCheckError::GraphWrite(e.to_string()))?;

            let existing = self
                .db
                .get_cf(&nodes_cf, &key)
                .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
            match existing {
                Some(old_bytes) if old_bytes == bytes => continue,
                Some(old_bytes) => {
                    if let Ok(old) = bincode::deserialize::<StoredNode>(&old_bytes) {
                        if old.parent != stored.parent {
                            if let Some(old_parent) = &old.parent {
                                batch.delete_cf(
                                    &children_cf,
                                    Self::index_key(namespace, old_parent, &stored.qualified_name),
                                );
                            }
                        }
                    }
                    outcome.updated += 1;
                }
                None => outcome.created += 1,
            }

            batch.put_cf(&nodes_cf, &key, &bytes);
            batch.put_cf(
                &names_cf,
                Self::index_key(namespace, &stored.name, &stored.qualified_name),
                [],
            );
            if let Some(parent) = &stored.parent {
                batch.put_cf(
                    &children_cf,
                    Self::index_key(namespace, parent, &stored.qualified_name),
                    [],
                );
            }
        }

        self.db
            .write(batch)
            .map_err(|e| GraphCheckError::GraphWrite(e.to_string()))?;
        Ok(outcome)
    }

    fn delete_absent_sync(&self, namespace: &str, keep: &HashSet<String>) -> Result<usize> {
        let nodes_cf = self.cf(NODES_CF)?;
        let children_cf = self.cf(CHILDREN_CF)?;
        let names_cf = self.cf(NAMES_CF)?;

        let prefix = Self::scan_prefix(&[namespace]);
        let iter = self
            .db
            .iterator_cf(&nodes_cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut batch = WriteBatch::default();
        let mut deleted = 0usize;
        for item in iter {
            let (key, value) = item.map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let qualified_name = String::from_utf8_lossy(&key[prefix.len()..]).to_string();
            if keep.contains(&qualified_name) {
                continue;
            }
            let stored: StoredNode = bincode::deserialize(&value)
                .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;

            batch.delete_cf(&nodes_cf, &key);
            batch.delete_cf(
                &names_cf,
                Self::index_key(namespace, &stored.name, &qualified_name),
            );
            if let Some(parent) = &stored.parent {
                batch.delete_cf(
                    &children_cf,
                    Self::index_key(namespace, parent, &qualified_name),
                );
            }
            deleted += 1;
        }

        self.db
            .write(batch)
            .map_err(|e| GraphCheckError::GraphWrite(e.to_string()))?;
        if deleted > 0 {
            debug!("Deleted {} stale nodes from '{}'", deleted, namespace);
        }
        Ok(deleted)
    }

    fn namespace_nodes_sync(&self, namespace: &str) -> Result<Vec<GraphNode>> {
        let nodes_cf = self.cf(NODES_CF)?;
        let prefix = Self::scan_prefix(&[namespace]);
        let iter = self
            .db
            .iterator_cf(&nodes_cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut nodes = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let stored: StoredNode = bincode::deserialize(&value)
                .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
            nodes.push(stored.into());
        }
        Ok(nodes)
    }
}

#[async_trait]
impl GraphStore for RocksDbGraphStore {
    async fn upsert_nodes(&self, namespace: &str, nodes: Vec<GraphNode>) -> Result<UpsertOutcome> {
        self.upsert_sync(namespace, nodes)
    }

    async fn lookup(&self, namespace: &str, qualified_name: &str) -> Result<Option<GraphNode>> {
        self.get_node(namespace, qualified_name)
    }

    async fn members_of(&self, namespace: &str, qualified_name: &str) -> Result<Vec<GraphNode>> {
        let prefix = Self::scan_prefix(&[namespace, qualified_name]);
        let children = self.scan_suffixes(CHILDREN_CF, &prefix)?;
        let mut members = Vec::with_capacity(children.len());
        for child in children {
            // Index entries can outlive their node between delete batches;
            // resolve through the payload CF and drop the stale ones.
            if let Some(node) = self.get_node(namespace, &child)? {
                members.push(node);
            }
        }
        Ok(members)
    }

    async fn find_by_name(&self, namespace: &str, name: &str) -> Result<Vec<GraphNode>> {
        let prefix = Self::scan_prefix(&[namespace, name]);
        let qualified = self.scan_suffixes(NAMES_CF, &prefix)?;
        let mut found = Vec::with_capacity(qualified.len());
        for qualified_name in qualified {
            if let Some(node) = self.get_node(namespace, &qualified_name)? {
                if node.name == name {
                    found.push(node);
                }
            }
        }
        Ok(found)
    }

    async fn delete_absent(&self, namespace: &str, keep: &HashSet<String>) -> Result<usize> {
        self.delete_absent_sync(namespace, keep)
    }

    async fn namespace_nodes(&self, namespace: &str) -> Result<Vec<GraphNode>> {
        self.namespace_nodes_sync(namespace)
    }

    async fn put_namespace_meta(&self, meta: NamespaceMeta) -> Result<()> {
        let cf = self.cf(META_CF)?;
        let stored = StoredMeta::from(meta);
        let bytes =
            bincode::serialize(&stored).map_err(|e| GraphCheckError::GraphWrite(e.to_string()))?;
        self.db
            .put_cf(&cf, stored.repository.as_bytes(), bytes)
            .map_err(|e| GraphCheckError::GraphWrite(e.to_string()))?;
        Ok(())
    }

    async fn namespace_meta(&self, namespace: &str) -> Result<Option<NamespaceMeta>> {
        let cf = self.cf(META_CF)?;
        let raw = self
            .db
            .get_cf(&cf, namespace.as_bytes())
            .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
        match raw {
            Some(bytes) => {
                let stored: StoredMeta = bincode::deserialize(&bytes)
                    .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
                Ok(Some(stored.into()))
            }
            None => Ok(None),
        }
    }

    async fn list_repositories(&self) -> Result<Vec<NamespaceMeta>> {
        let cf = self.cf(META_CF)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        let mut repos = Vec::new();
        for item in iter {
            let (_, value) = item.map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
            let stored: StoredMeta = bincode::deserialize(&value)
                .map_err(|e| GraphCheckError::GraphRead(e.to_string()))?;
            repos.push(stored.into());
        }
        Ok(repos)
    }
}

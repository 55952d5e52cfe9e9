use crate::error::Result;
use crate::types::{GraphNode, NamespaceMeta, UpsertOutcome};
use async_trait::async_trait;
use std::collections::HashSet;

/// Property-graph store boundary. Implementations are internally
/// synchronized; one shared handle serves concurrent readers and the
/// single writer an ingest holds per namespace.
///
/// Nothing here assumes a query language: upsert-by-key, point lookup,
/// children listing, name search, and delete-by-namespace-minus-set are the
/// whole contract.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Upsert a batch of nodes under a repository namespace. Nodes whose
    /// stored payload is byte-identical to the new payload count as neither
    /// created nor updated.
    async fn upsert_nodes(&self, namespace: &str, nodes: Vec<GraphNode>) -> Result<UpsertOutcome>;

    /// Point lookup by qualified name.
    async fn lookup(&self, namespace: &str, qualified_name: &str) -> Result<Option<GraphNode>>;

    /// All nodes whose parent is `qualified_name` (members of a class,
    /// symbols of a file, files of the repository root).
    async fn members_of(&self, namespace: &str, qualified_name: &str) -> Result<Vec<GraphNode>>;

    /// All nodes in the namespace with the given simple name.
    async fn find_by_name(&self, namespace: &str, name: &str) -> Result<Vec<GraphNode>>;

    /// Delete every node in the namespace whose qualified name is not in
    /// `keep`. Returns the number of nodes deleted.
    async fn delete_absent(&self, namespace: &str, keep: &HashSet<String>) -> Result<usize>;

    /// Every node in the namespace. Exploration surface; not used on the
    /// validation path.
    async fn namespace_nodes(&self, namespace: &str) -> Result<Vec<GraphNode>>;

    /// Ingest bookkeeping, stored beside the nodes.
    async fn put_namespace_meta(&self, meta: NamespaceMeta) -> Result<()>;

    async fn namespace_meta(&self, namespace: &str) -> Result<Option<NamespaceMeta>>;

    /// Metadata for every ingested repository.
    async fn list_repositories(&self) -> Result<Vec<NamespaceMeta>>;
}

use async_trait::async_trait;
use dashmap::DashMap;
use graphcheck_core::{GraphNode, GraphStore, NamespaceMeta, Result, UpsertOutcome};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// In-memory store. Primary map is keyed by (namespace, qualified name);
/// a children index serves member listings. Shared freely across tasks.
#[derive(Default)]
pub struct MemoryGraphStore {
    nodes: DashMap<(String, String), GraphNode>,
    children: DashMap<(String, String), HashSet<String>>,
    meta: RwLock<HashMap<String, NamespaceMeta>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_child(&self, namespace: &str, node: &GraphNode) {
        if let Some(parent) = &node.parent {
            self.children
                .entry((namespace.to_string(), parent.clone()))
                .or_default()
                .insert(node.qualified_name.clone());
        }
    }

    fn unindex_child(&self, namespace: &str, parent: &str, qualified_name: &str) {
        if let Some(mut entry) = self
            .children
            .get_mut(&(namespace.to_string(), parent.to_string()))
        {
            entry.remove(qualified_name);
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_nodes(&self, namespace: &str, nodes: Vec<GraphNode>) -> Result<UpsertOutcome> {
        let mut outcome = UpsertOutcome::default();
        for node in nodes {
            let key = (namespace.to_string(), node.qualified_name.clone());
            match self.nodes.get(&key).map(|existing| existing.clone()) {
                Some(existing) if existing == node => continue,
                Some(existing) => {
                    if existing.parent != node.parent {
                        if let Some(old_parent) = &existing.parent {
                            self.unindex_child(namespace, old_parent, &node.qualified_name);
                        }
                    }
                    self.index_child(namespace, &node);
                    self.nodes.insert(key, node);
                    outcome.updated += 1;
                }
                None => {
                    self.index_child(namespace, &node);
                    self.nodes.insert(key, node);
                    outcome.created += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn lookup(&self, namespace: &str, qualified_name: &str) -> Result<Option<GraphNode>> {
        let key = (namespace.to_string(), qualified_name.to_string());
        Ok(self.nodes.get(&key).map(|n| n.clone()))
    }

    async fn members_of(&self, namespace: &str, qualified_name: &str) -> Result<Vec<GraphNode>> {
        let key = (namespace.to_string(), qualified_name.to_string());
        let mut child_names: Vec<String> = match self.children.get(&key) {
            Some(set) => set.iter().cloned().collect(),
            None => return Ok(Vec::new()),
        };
        child_names.sort();

        let mut members = Vec::with_capacity(child_names.len());
        for child in child_names {
            let child_key = (namespace.to_string(), child);
            if let Some(node) = self.nodes.get(&child_key) {
                members.push(node.clone());
            }
        }
        Ok(members)
    }

    async fn find_by_name(&self, namespace: &str, name: &str) -> Result<Vec<GraphNode>> {
        let mut found: Vec<GraphNode> = self
            .nodes
            .iter()
            .filter(|entry| entry.key().0 == namespace && entry.value().name == name)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        Ok(found)
    }

    async fn delete_absent(&self, namespace: &str, keep: &HashSet<String>) -> Result<usize> {
        let doomed: Vec<(String, Option<String>)> = self
            .nodes
            .iter()
            .filter(|entry| {
                entry.key().0 == namespace && !keep.contains(&entry.value().qualified_name)
            })
            .map(|entry| (entry.value().qualified_name.clone(), entry.value().parent.clone()))
            .collect();

        for (qualified_name, parent) in &doomed {
            self.nodes
                .remove(&(namespace.to_string(), qualified_name.clone()));
            self.children
                .remove(&(namespace.to_string(), qualified_name.clone()));
            if let Some(parent) = parent {
                self.unindex_child(namespace, parent, qualified_name);
            }
        }
        Ok(doomed.len())
    }

    async fn namespace_nodes(&self, namespace: &str) -> Result<Vec<GraphNode>> {
        let mut nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .filter(|entry| entry.key().0 == namespace)
            .map(|entry| entry.value().clone())
            .collect();
        nodes.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        Ok(nodes)
    }

    async fn put_namespace_meta(&self, meta: NamespaceMeta) -> Result<()> {
        self.meta.write().insert(meta.repository.clone(), meta);
        Ok(())
    }

    async fn namespace_meta(&self, namespace: &str) -> Result<Option<NamespaceMeta>> {
        Ok(self.meta.read().get(namespace).cloned())
    }

    async fn list_repositories(&self) -> Result<Vec<NamespaceMeta>> {
        let mut repos: Vec<NamespaceMeta> = self.meta.read().values().cloned().collect();
        repos.sort_by(|a, b| a.repository.cmp(&b.repository));
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcheck_core::{EdgeKind, SymbolKind};

    fn class_node(qualified: &str, parent: &str) -> GraphNode {
        let name = qualified.rsplit('.').next().unwrap().to_string();
        GraphNode::new(qualified, name, SymbolKind::Class).with_parent(parent, EdgeKind::Defines)
    }

    #[tokio::test]
    async fn upsert_counts_created_then_unchanged() {
        let store = MemoryGraphStore::new();
        let nodes = vec![
            class_node("pkg.mod.Foo", "pkg.mod"),
            class_node("pkg.mod.Bar", "pkg.mod"),
        ];

        let first = store.upsert_nodes("repo", nodes.clone()).await.unwrap();
        assert_eq!(first, UpsertOutcome { created: 2, updated: 0 });

        let second = store.upsert_nodes("repo", nodes).await.unwrap();
        assert_eq!(second, UpsertOutcome { created: 0, updated: 0 });
    }

    #[tokio::test]
    async fn upsert_detects_changed_payload() {
        let store = MemoryGraphStore::new();
        store
            .upsert_nodes("repo", vec![class_node("pkg.mod.Foo", "pkg.mod")])
            .await
            .unwrap();

        let changed = class_node("pkg.mod.Foo", "pkg.mod").with_bases(vec!["Base".to_string()]);
        let outcome = store.upsert_nodes("repo", vec![changed]).await.unwrap();
        assert_eq!(outcome, UpsertOutcome { created: 0, updated: 1 });

        let stored = store.lookup("repo", "pkg.mod.Foo").await.unwrap().unwrap();
        assert_eq!(stored.bases, vec!["Base".to_string()]);
    }

    #[tokio::test]
    async fn members_and_name_search_respect_namespaces() {
        let store = MemoryGraphStore::new();
        store
            .upsert_nodes("alpha", vec![class_node("pkg.mod.Foo", "pkg.mod")])
            .await
            .unwrap();
        store
            .upsert_nodes("beta", vec![class_node("pkg.mod.Foo", "pkg.mod")])
            .await
            .unwrap();

        let members = store.members_of("alpha", "pkg.mod").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].qualified_name, "pkg.mod.Foo");

        let found = store.find_by_name("beta", "Foo").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(store.find_by_name("gamma", "Foo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_absent_removes_only_missing_nodes() {
        let store = MemoryGraphStore::new();
        store
            .upsert_nodes(
                "repo",
                vec![
                    class_node("pkg.mod.Foo", "pkg.mod"),
                    class_node("pkg.mod.Bar", "pkg.mod"),
                ],
            )
            .await
            .unwrap();

        let keep: HashSet<String> = ["pkg.mod.Foo".to_string()].into_iter().collect();
        let deleted = store.delete_absent("repo", &keep).await.unwrap();
        assert_eq!(deleted, 1);

        assert!(store.lookup("repo", "pkg.mod.Bar").await.unwrap().is_none());
        assert!(store.lookup("repo", "pkg.mod.Foo").await.unwrap().is_some());
        let members = store.members_of("repo", "pkg.mod").await.unwrap();
        assert_eq!(members.len(), 1);
    }
}

// SSHE — Node Store
//
// In-memory node list plus its tag index, backed by a `NodeBackend`.
// Mutations keep the index in step with the nodes and flush the whole
// document; lookups never write.
//
// Index invariant: for every node N and every distinct tag t of N,
// "N.ip@N.username" appears exactly once in tag_index[t], and every reference
// in the index points at an existing node carrying that tag. Empty buckets
// are pruned.

use super::document::NodeBackend;
use super::models::{node_ref, Node, NodesFile, TagIndex};
use super::StoreError;

pub struct NodeStore {
    doc: NodesFile,
    backend: Box<dyn NodeBackend>,
}

impl NodeStore {
    /// Load the store from `backend`. A tag index that does not match the
    /// nodes is rebuilt in memory and written with the next mutation.
    pub fn open(backend: impl NodeBackend + 'static) -> Result<Self, StoreError> {
        let doc = backend.load()?;
        let mut store = Self {
            doc,
            backend: Box::new(backend),
        };

        if !store.index_is_consistent() {
            tracing::warn!("Tag index does not match stored nodes, rebuilding it");
            store.rebuild_index();
        }

        Ok(store)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.doc.nodes
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.doc.tag_index
    }

    /// Append a node and index its tags, then flush.
    ///
    /// The caller must have checked that (ip, username) is not taken; see
    /// `select::resolve_new_username`. Duplicate and empty tags are dropped.
    pub fn add(
        &mut self,
        ip: &str,
        username: &str,
        encrypted_password: &str,
        tags: &[String],
    ) -> Result<(), StoreError> {
        let mut unique: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.trim();
            if !tag.is_empty() && !unique.iter().any(|t| t == tag) {
                unique.push(tag.to_string());
            }
        }

        let reference = node_ref(ip, username);
        for tag in &unique {
            self.doc
                .tag_index
                .entry(tag.clone())
                .or_default()
                .push(reference.clone());
        }

        self.doc.nodes.push(Node::new(
            ip.to_string(),
            username.to_string(),
            encrypted_password.to_string(),
            unique,
        ));

        self.flush()?;
        tracing::info!(ip = %ip, username = %username, "Node stored");
        Ok(())
    }

    /// Nodes at `ip`. An empty `username` returns every user at that ip in
    /// insertion order; otherwise at most the one exact match.
    pub fn find(&self, ip: &str, username: &str) -> Vec<Node> {
        let found: Vec<Node> = self
            .doc
            .nodes
            .iter()
            .filter(|n| n.ip == ip && (username.is_empty() || n.username == username))
            .cloned()
            .collect();

        tracing::debug!(ip = %ip, username = %username, matches = found.len(), "Node lookup");
        found
    }

    /// Usernames already recorded for `ip`, in insertion order.
    pub fn usernames_at(&self, ip: &str) -> Vec<String> {
        self.doc
            .nodes
            .iter()
            .filter(|n| n.ip == ip)
            .map(|n| n.username.clone())
            .collect()
    }

    /// Remove the node for (ip, username). Returns false, without flushing,
    /// when there is no such node.
    pub fn delete(&mut self, ip: &str, username: &str) -> Result<bool, StoreError> {
        let Some(pos) = self
            .doc
            .nodes
            .iter()
            .position(|n| n.ip == ip && n.username == username)
        else {
            tracing::debug!(ip = %ip, username = %username, "Nothing to delete");
            return Ok(false);
        };

        let node = self.doc.nodes.remove(pos);
        let reference = node.reference();

        for tag in node.distinct_tags() {
            let now_empty = match self.doc.tag_index.get_mut(tag) {
                Some(bucket) => {
                    if let Some(i) = bucket.iter().position(|r| *r == reference) {
                        bucket.remove(i);
                    }
                    bucket.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.doc.tag_index.remove(tag);
            }
        }

        self.flush()?;
        tracing::info!(ip = %ip, username = %username, "Node deleted");
        Ok(true)
    }

    /// Whether the tag index is exactly what the nodes imply. Empty buckets
    /// and bucket order are ignored.
    pub fn index_is_consistent(&self) -> bool {
        let expected = build_index(&self.doc.nodes);

        let actual: TagIndex = self
            .doc
            .tag_index
            .iter()
            .filter(|(_, refs)| !refs.is_empty())
            .map(|(tag, refs)| {
                let mut refs = refs.clone();
                refs.sort();
                (tag.clone(), refs)
            })
            .collect();

        let expected: TagIndex = expected
            .into_iter()
            .map(|(tag, mut refs)| {
                refs.sort();
                (tag, refs)
            })
            .collect();

        actual == expected
    }

    /// Recompute the tag index from the nodes alone.
    pub fn rebuild_index(&mut self) {
        self.doc.tag_index = build_index(&self.doc.nodes);
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.backend.save(&self.doc)
    }
}

/// The tag index implied by `nodes`, references in node order.
fn build_index(nodes: &[Node]) -> TagIndex {
    let mut index = TagIndex::new();
    for node in nodes {
        let reference = node.reference();
        for tag in node.distinct_tags() {
            index
                .entry(tag.to_string())
                .or_default()
                .push(reference.clone());
        }
    }
    index
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::mock::MemoryBackend;
    use crate::store::YamlFile;

    const CIPHER: &str = "1c2711ef8516c805e2cc2599f2742b39";

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn open_empty() -> (NodeStore, MemoryBackend) {
        let backend = MemoryBackend::new();
        let store = NodeStore::open(backend.clone()).unwrap();
        (store, backend)
    }

    /// Checks the index against the nodes with an independent computation.
    fn assert_index_matches_nodes(store: &NodeStore) {
        let mut expected: Vec<(String, String)> = Vec::new();
        for node in store.nodes() {
            for tag in node.distinct_tags() {
                expected.push((tag.to_string(), node.reference()));
            }
        }
        let mut actual: Vec<(String, String)> = Vec::new();
        for (tag, refs) in store.tag_index() {
            assert!(!refs.is_empty(), "bucket {:?} should have been pruned", tag);
            for r in refs {
                actual.push((tag.clone(), r.clone()));
            }
        }
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected, "tag index must mirror node tags exactly");
        assert!(store.index_is_consistent());
    }

    #[test]
    fn test_add_appends_node_and_indexes_tags() {
        let (mut store, backend) = open_empty();
        store
            .add("10.0.0.1", "root", CIPHER, &tags(&["prod", "db"]))
            .unwrap();

        assert_eq!(store.nodes().len(), 1);
        assert_eq!(store.nodes()[0].encrypted_password(), CIPHER);
        assert_eq!(store.tag_index()["prod"], vec!["10.0.0.1@root"]);
        assert_eq!(store.tag_index()["db"], vec!["10.0.0.1@root"]);
        assert_eq!(backend.saves(), 1, "add must flush once");
        assert_eq!(backend.saved().nodes.len(), 1);
    }

    #[test]
    fn test_add_drops_duplicate_and_blank_tags() {
        let (mut store, _backend) = open_empty();
        store
            .add("10.0.0.1", "root", CIPHER, &tags(&["prod", "", "prod", " db "]))
            .unwrap();

        assert_eq!(store.nodes()[0].tags, vec!["prod", "db"]);
        assert_eq!(store.tag_index()["prod"].len(), 1);
        assert_index_matches_nodes(&store);
    }

    #[test]
    fn test_find_by_ip_returns_all_users_in_insertion_order() {
        let (mut store, _backend) = open_empty();
        store.add("10.0.0.1", "root", CIPHER, &[]).unwrap();
        store.add("10.0.0.2", "root", CIPHER, &[]).unwrap();
        store.add("10.0.0.1", "admin", CIPHER, &[]).unwrap();

        let found = store.find("10.0.0.1", "");
        let users: Vec<&str> = found.iter().map(|n| n.username.as_str()).collect();
        assert_eq!(users, vec!["root", "admin"]);
    }

    #[test]
    fn test_find_with_username_returns_at_most_one() {
        let (mut store, _backend) = open_empty();
        store.add("10.0.0.1", "root", CIPHER, &[]).unwrap();
        store.add("10.0.0.1", "admin", CIPHER, &[]).unwrap();

        let found = store.find("10.0.0.1", "admin");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "admin");
        assert!(store.find("10.0.0.1", "nobody").is_empty());
        assert!(store.find("10.9.9.9", "").is_empty());
    }

    #[test]
    fn test_usernames_at() {
        let (mut store, _backend) = open_empty();
        store.add("10.0.0.1", "root", CIPHER, &[]).unwrap();
        store.add("10.0.0.1", "deploy", CIPHER, &[]).unwrap();
        assert_eq!(store.usernames_at("10.0.0.1"), vec!["root", "deploy"]);
        assert!(store.usernames_at("10.0.0.2").is_empty());
    }

    #[test]
    fn test_delete_missing_node_is_a_noop_without_flush() {
        let (mut store, backend) = open_empty();
        store.add("10.0.0.1", "root", CIPHER, &tags(&["prod"])).unwrap();
        let before = store.tag_index().clone();

        let deleted = store.delete("10.0.0.1", "nosuchuser").unwrap();
        assert!(!deleted, "delete must report that nothing was found");
        assert_eq!(store.nodes().len(), 1);
        assert_eq!(store.tag_index(), &before);
        assert_eq!(backend.saves(), 1, "a no-op delete must not flush");
    }

    #[test]
    fn test_delete_removes_only_its_own_reference() {
        let (mut store, backend) = open_empty();
        store.add("10.0.0.1", "root", CIPHER, &tags(&["prod", "db"])).unwrap();
        store.add("10.0.0.1", "admin", CIPHER, &tags(&["prod"])).unwrap();

        assert!(store.delete("10.0.0.1", "root").unwrap());
        assert_eq!(store.tag_index()["prod"], vec!["10.0.0.1@admin"]);
        assert!(!store.tag_index().contains_key("db"), "empty bucket is pruned");
        assert_eq!(backend.saves(), 3);
        assert_eq!(backend.saved().nodes.len(), 1);
        assert_index_matches_nodes(&store);
    }

    #[test]
    fn test_index_invariant_holds_across_mixed_operations() {
        let (mut store, _backend) = open_empty();
        let ops: &[(&str, &str, &[&str], bool)] = &[
            ("10.0.0.1", "root", &["prod", "db"], true),
            ("10.0.0.2", "root", &["prod", "web"], true),
            ("10.0.0.1", "admin", &["db"], true),
            ("10.0.0.2", "root", &[], false),
            ("10.0.0.3", "ops", &["web", "edge", "web"], true),
            ("10.0.0.1", "root", &[], false),
            ("10.0.0.2", "root", &["prod"], true),
            ("10.0.0.9", "ghost", &[], false),
        ];

        for (ip, user, tag_list, is_add) in ops {
            if *is_add {
                store.add(ip, user, CIPHER, &tags(tag_list)).unwrap();
            } else {
                store.delete(ip, user).unwrap();
            }
            assert_index_matches_nodes(&store);
        }

        assert_eq!(store.nodes().len(), 3);
        assert_eq!(store.tag_index()["prod"], vec!["10.0.0.2@root"]);
        assert_eq!(store.tag_index()["db"], vec!["10.0.0.1@admin"]);
        assert_eq!(store.tag_index()["web"], vec!["10.0.0.3@ops"]);
    }

    #[test]
    fn test_failed_flush_is_reported() {
        let (mut store, backend) = open_empty();
        backend.fail_saves(true);

        let err = store.add("10.0.0.1", "root", CIPHER, &[]).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(backend.saved().nodes.is_empty(), "persisted state must be unchanged");
    }

    #[test]
    fn test_open_rebuilds_stale_index() {
        let mut doc = NodesFile::default();
        doc.nodes.push(Node::new(
            "10.0.0.1".to_string(),
            "root".to_string(),
            CIPHER.to_string(),
            tags(&["prod"]),
        ));
        doc.tag_index.insert(
            "prod".to_string(),
            vec!["10.0.0.1@root".to_string(), "10.0.0.5@gone".to_string()],
        );
        doc.tag_index.insert("old".to_string(), vec!["10.0.0.5@gone".to_string()]);

        let backend = MemoryBackend::with_document(doc);
        let store = NodeStore::open(backend.clone()).unwrap();

        assert_index_matches_nodes(&store);
        assert_eq!(backend.saves(), 0, "opening the store must not write");
    }

    #[test]
    fn test_open_accepts_empty_buckets_from_older_files() {
        let mut doc = NodesFile::default();
        doc.tag_index.insert("retired".to_string(), vec![]);

        let store = NodeStore::open(MemoryBackend::with_document(doc)).unwrap();
        assert!(store.index_is_consistent());
        assert!(store.tag_index().contains_key("retired"), "consistent index is left alone");
    }

    #[test]
    fn test_changes_survive_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.yaml");

        {
            let mut store = NodeStore::open(YamlFile::new(&path)).unwrap();
            store.add("10.0.0.1", "root", CIPHER, &tags(&["prod"])).unwrap();
            store.add("10.0.0.1", "admin", CIPHER, &tags(&["prod"])).unwrap();
            store.delete("10.0.0.1", "root").unwrap();
        }

        let store = NodeStore::open(YamlFile::new(&path)).unwrap();
        assert_eq!(store.nodes().len(), 1);
        assert_eq!(store.nodes()[0].username, "admin");
        assert_eq!(store.tag_index()["prod"], vec!["10.0.0.1@admin"]);
    }
}

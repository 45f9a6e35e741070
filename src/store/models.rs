// SSHE — Node data models
//
// `Node` mirrors one entry of node.yaml. Its `password` is the hex cipher
// text produced by the password codec; it is kept out of Debug output anyway
// and never appears in `NodeSummary`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag → list of "ip@username" references.
pub type TagIndex = BTreeMap<String, Vec<String>>;

/// Build the "ip@username" reference used as a node's identity in the tag index.
pub fn node_ref(ip: &str, username: &str) -> String {
    format!("{}@{}", ip, username)
}

/// One stored SSH target.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub ip: String,
    pub username: String,
    /// Encrypted password, lowercase hex
    password: String,
    #[serde(rename = "tag", default)]
    pub tags: Vec<String>,
}

impl Node {
    pub fn new(ip: String, username: String, password: String, tags: Vec<String>) -> Self {
        Self {
            ip,
            username,
            password,
            tags,
        }
    }

    /// The persisted cipher text. Decrypt it with the configured codec.
    pub fn encrypted_password(&self) -> &str {
        &self.password
    }

    /// The node's identity reference, "ip@username".
    pub fn reference(&self) -> String {
        node_ref(&self.ip, &self.username)
    }

    /// Distinct tags in first-seen order.
    pub fn distinct_tags(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag.as_str());
            }
        }
        seen
    }

    /// Tags rendered the way the CLI shows them: `#prod #db`.
    pub fn display_tags(&self) -> String {
        self.tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("ip", &self.ip)
            .field("username", &self.username)
            .field("password", &"[ENCRYPTED]")
            .field("tags", &self.tags)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.ip)?;
        if !self.tags.is_empty() {
            write!(f, " {}", self.display_tags())?;
        }
        Ok(())
    }
}

/// The whole node.yaml document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodesFile {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub tag_index: TagIndex,
}

/// A node without its password, used for `list --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    pub ip: String,
    pub username: String,
    pub tags: Vec<String>,
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        Self {
            ip: node.ip.clone(),
            username: node.username.clone(),
            tags: node.tags.clone(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new(
            "10.0.0.1".to_string(),
            "root".to_string(),
            "1c2711ef8516c805e2cc2599f2742b39".to_string(),
            vec!["prod".to_string(), "db".to_string(), "prod".to_string()],
        )
    }

    #[test]
    fn test_node_debug_hides_password() {
        let debug_output = format!("{:?}", sample());
        assert!(debug_output.contains("[ENCRYPTED]"));
        assert!(
            !debug_output.contains("1c2711ef"),
            "Debug output must not contain the cipher text"
        );
    }

    #[test]
    fn test_reference_and_display() {
        let node = sample();
        assert_eq!(node.reference(), "10.0.0.1@root");
        assert_eq!(node.to_string(), "root@10.0.0.1 #prod #db #prod");
    }

    #[test]
    fn test_distinct_tags_keeps_first_occurrence() {
        assert_eq!(sample().distinct_tags(), vec!["prod", "db"]);
    }

    #[test]
    fn test_yaml_layout_matches_node_file() {
        let file = NodesFile {
            nodes: vec![sample()],
            tag_index: TagIndex::from([("db".to_string(), vec!["10.0.0.1@root".to_string()])]),
        };
        let yaml = serde_yaml::to_string(&file).unwrap();
        assert!(yaml.contains("nodes:"));
        assert!(yaml.contains("tag_index:"));
        assert!(yaml.contains("password: 1c2711ef8516c805e2cc2599f2742b39"));
        assert!(yaml.contains("tag:"), "tag list is persisted under the `tag` key");
    }

    #[test]
    fn test_reads_document_written_by_older_releases() {
        let yaml = "\
nodes:
    - ip: 192.168.1.10
      username: root
      password: 1c2711ef8516c805e2cc2599f2742b39
      tag:
        - web
    - ip: 192.168.1.11
      username: admin
      password: 1c2711ef8516c805e2cc2599f2742b39
      tag: []
tag_index:
    web:
        - 192.168.1.10@root
";
        let file: NodesFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.nodes.len(), 2);
        assert_eq!(file.nodes[0].tags, vec!["web"]);
        assert!(file.nodes[1].tags.is_empty());
        assert_eq!(file.tag_index["web"], vec!["192.168.1.10@root"]);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let file: NodesFile = serde_yaml::from_str("nodes: []\n").unwrap();
        assert!(file.nodes.is_empty());
        assert!(file.tag_index.is_empty());
    }

    #[test]
    fn test_summary_has_no_password() {
        let summary = NodeSummary::from(&sample());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("1c2711ef"));
    }
}

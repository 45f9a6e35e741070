// SSHE — Query Matcher
//
// Multi-predicate filter used by `sshe list`. Every supplied predicate must
// hold (AND within a category, AND across categories). An empty filter
// matches every node.

use crate::store::Node;

/// Predicates over IP, username, and tags. Each list may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    /// IP must equal one of these.
    pub ips: Vec<String>,
    pub ip_starts: Vec<String>,
    pub ip_ends: Vec<String>,
    pub ip_contains: Vec<String>,

    /// Username must equal one of these.
    pub users: Vec<String>,
    pub user_starts: Vec<String>,
    pub user_ends: Vec<String>,
    pub user_contains: Vec<String>,

    /// Node must carry every one of these tags.
    pub tags: Vec<String>,
    /// For each entry, at least one tag must start with it (likewise for
    /// `tag_ends` and `tag_contains`).
    pub tag_starts: Vec<String>,
    pub tag_ends: Vec<String>,
    pub tag_contains: Vec<String>,
}

impl NodeFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, node: &Node) -> bool {
        field_matches(&node.ip, &self.ips, &self.ip_starts, &self.ip_ends, &self.ip_contains)
            && field_matches(
                &node.username,
                &self.users,
                &self.user_starts,
                &self.user_ends,
                &self.user_contains,
            )
            && self.tags_match(&node.tags)
    }

    /// Matching nodes in store order.
    pub fn filter<'a>(&self, nodes: &'a [Node]) -> Vec<&'a Node> {
        nodes.iter().filter(|n| self.matches(n)).collect()
    }

    fn tags_match(&self, tags: &[String]) -> bool {
        self.tags.iter().all(|wanted| tags.contains(wanted))
            && self
                .tag_starts
                .iter()
                .all(|p| tags.iter().any(|t| t.starts_with(p.as_str())))
            && self
                .tag_ends
                .iter()
                .all(|s| tags.iter().any(|t| t.ends_with(s.as_str())))
            && self
                .tag_contains
                .iter()
                .all(|c| tags.iter().any(|t| t.contains(c.as_str())))
    }
}

fn field_matches(
    value: &str,
    equals_any: &[String],
    starts: &[String],
    ends: &[String],
    contains: &[String],
) -> bool {
    (equals_any.is_empty() || equals_any.iter().any(|v| v == value))
        && starts.iter().all(|p| value.starts_with(p.as_str()))
        && ends.iter().all(|s| value.ends_with(s.as_str()))
        && contains.iter().all(|c| value.contains(c.as_str()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

//! The visual fragment model: a style-resolved, renderer-neutral tree for one cycle.
//!
//! Fragments are produced by the flattener and consumed by every capture strategy.
//! Before capturing, strategies run [`prepare_for_capture`], which strips UI
//! controls and marks every node visible.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::converters::style::Band;
use crate::models::classification::TreeStats;
use crate::models::rich_text::RichText;

/// Path-like identity of a node (`cycle:1/group:3/table:2`).
/// Ids are only unique within their own collection, so the full path is the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn cycle(id: u32) -> Self {
        NodeKey(format!("cycle:{id}"))
    }

    pub fn child(&self, kind: &str, id: u32) -> Self {
        NodeKey(format!("{}/{kind}:{id}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        NodeKey(value.to_string())
    }
}

/// Level of a section in the classification hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Cycle,
    Group,
    Subgroup,
    Category,
}

/// A table ready for rendering: band resolved, rows reduced to cell text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub name: String,
    pub band: Band,
    pub column_count: usize,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A cycle, group, subgroup or category: header plus nested content.
    /// Cycles and groups carry a colored band.
    Section {
        level: Level,
        name: String,
        band: Option<Band>,
    },
    /// Rich-text preparations, embedded verbatim.
    Preparations(RichText),
    Table(TableBlock),
    /// An editor affordance (edit/add buttons). Never part of captured output.
    Control { label: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentNode {
    pub key: NodeKey,
    pub kind: NodeKind,
    /// Rendered-visible flag; false when the live view had the region collapsed.
    pub visible: bool,
    pub children: Vec<FragmentNode>,
}

impl FragmentNode {
    pub fn new(key: NodeKey, kind: NodeKind) -> Self {
        FragmentNode {
            key,
            kind,
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self.kind, NodeKind::Control { .. })
    }

    /// Section level, if this node is a section.
    pub fn level(&self) -> Option<Level> {
        match &self.kind {
            NodeKind::Section { level, .. } => Some(*level),
            _ => None,
        }
    }

    fn normalize(&mut self) {
        self.visible = true;
        self.children.retain(|child| !child.is_control());
        for child in &mut self.children {
            child.normalize();
        }
    }
}

/// One printable rendering of a single cycle and its full subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualFragment {
    pub cycle_id: u32,
    /// A hard page break precedes this fragment.
    pub break_before: bool,
    pub root: FragmentNode,
}

impl VisualFragment {
    /// Cycle name from the root section.
    pub fn title(&self) -> &str {
        match &self.root.kind {
            NodeKind::Section { name, .. } => name,
            _ => "",
        }
    }

    /// Depth-first, pre-order traversal in source order.
    pub fn walk(&self) -> DepthFirst<'_> {
        DepthFirst {
            stack: vec![&self.root],
        }
    }

    /// True when the fragment holds a cycle section or a table.
    pub fn has_content(&self) -> bool {
        self.walk().any(|node| {
            matches!(node.level(), Some(Level::Cycle)) || matches!(node.kind, NodeKind::Table(_))
        })
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for node in self.walk() {
            match (&node.kind, node.level()) {
                (_, Some(Level::Cycle)) => stats.cycles += 1,
                (_, Some(Level::Group)) => stats.groups += 1,
                (_, Some(Level::Subgroup)) => stats.subgroups += 1,
                (_, Some(Level::Category)) => stats.categories += 1,
                (NodeKind::Table(_), _) => stats.tables += 1,
                _ => {}
            }
        }
        stats
    }
}

/// Iterator returned by [`VisualFragment::walk`].
pub struct DepthFirst<'a> {
    stack: Vec<&'a FragmentNode>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a FragmentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Visibility normalization. Returns a copy of `fragments` with every control
/// removed, every node visible and a page break before every fragment but the first.
pub fn prepare_for_capture(fragments: &[VisualFragment]) -> Vec<VisualFragment> {
    fragments
        .iter()
        .enumerate()
        .map(|(index, fragment)| {
            let mut fragment = fragment.clone();
            fragment.root.normalize();
            fragment.break_before = index > 0;
            fragment
        })
        .collect()
}

/// True when no fragment holds any cycle or table.
pub fn is_content_empty(fragments: &[VisualFragment]) -> bool {
    !fragments.iter().any(VisualFragment::has_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(key: &str, level: Level, name: &str) -> FragmentNode {
        FragmentNode::new(
            NodeKey::from(key),
            NodeKind::Section {
                level,
                name: name.to_string(),
                band: None,
            },
        )
    }

    fn control(key: &str) -> FragmentNode {
        FragmentNode::new(
            NodeKey::from(key),
            NodeKind::Control {
                label: "Edit".to_string(),
            },
        )
    }

    fn sample() -> VisualFragment {
        let mut group = section("cycle:1/group:1", Level::Group, "G");
        group.visible = false;
        group.children.push(control("cycle:1/group:1/control:edit"));
        let mut root = section("cycle:1", Level::Cycle, "C");
        root.children.push(control("cycle:1/control:edit"));
        root.children.push(group);
        VisualFragment {
            cycle_id: 1,
            break_before: true,
            root,
        }
    }

    #[test]
    fn node_keys_are_paths() {
        let key = NodeKey::cycle(2).child("group", 5).child("table", 1);
        assert_eq!(key.as_str(), "cycle:2/group:5/table:1");
    }

    #[test]
    fn walk_is_preorder() {
        let fragment = sample();
        let keys: Vec<&str> = fragment.walk().map(|n| n.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "cycle:1",
                "cycle:1/control:edit",
                "cycle:1/group:1",
                "cycle:1/group:1/control:edit"
            ]
        );
    }

    #[test]
    fn normalization_strips_controls_and_forces_visibility() {
        let prepared = prepare_for_capture(&[sample(), sample()]);
        for fragment in &prepared {
            assert!(fragment.walk().all(|n| n.visible));
            assert!(fragment.walk().all(|n| !n.is_control()));
        }
        assert!(!prepared[0].break_before);
        assert!(prepared[1].break_before);
    }

    #[test]
    fn content_detection() {
        assert!(is_content_empty(&[]));
        assert!(!is_content_empty(&[sample()]));
        assert_eq!(sample().stats().groups, 1);
    }
}

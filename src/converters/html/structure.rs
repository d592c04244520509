//! Tree flattener: turns classification cycles into style-resolved fragments.
//!
//! The walk is depth-first and keeps source order at every level:
//! header, preparations, tables, then nested sections.

use std::collections::HashSet;

use super::fragment::{FragmentNode, Level, NodeKey, NodeKind, TableBlock, VisualFragment};
use crate::converters::style::Band;
use crate::models::classification::{Category, Cycle, Group, NodeContent, Subgroup};
use crate::models::table::Table;

/// Live-view state that influences the flattened tree.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Emit editor controls (edit/add/delete affordances) as `Control` nodes.
    pub edit_mode: bool,
    /// Keys of regions the user collapsed in the live view.
    pub collapsed: HashSet<NodeKey>,
}

impl RenderOptions {
    /// Options matching the editor view with edit mode enabled.
    pub fn editing() -> Self {
        RenderOptions {
            edit_mode: true,
            ..RenderOptions::default()
        }
    }

    pub fn collapse(mut self, key: NodeKey) -> Self {
        self.collapsed.insert(key);
        self
    }
}

/// Renders one fragment per cycle with the default (read-only, fully expanded) view.
pub fn render(cycles: &[Cycle]) -> Vec<VisualFragment> {
    render_with(cycles, &RenderOptions::default())
}

/// Renders one fragment per cycle, mirroring the live view described by `options`.
///
/// Every fragment after the first is marked with a page break.
pub fn render_with(cycles: &[Cycle], options: &RenderOptions) -> Vec<VisualFragment> {
    cycles
        .iter()
        .enumerate()
        .map(|(index, cycle)| VisualFragment {
            cycle_id: cycle.id,
            break_before: index > 0,
            root: flatten_cycle(cycle, options),
        })
        .collect()
}

fn section(
    key: NodeKey,
    level: Level,
    name: &str,
    band: Option<Band>,
    options: &RenderOptions,
) -> FragmentNode {
    let mut node = FragmentNode::new(
        key.clone(),
        NodeKind::Section {
            level,
            name: name.to_string(),
            band,
        },
    );
    node.visible = !options.collapsed.contains(&key);
    if options.edit_mode {
        node.children.push(control(&key, "edit", "Edit"));
    }
    node
}

fn control(parent: &NodeKey, action: &str, label: &str) -> FragmentNode {
    FragmentNode::new(
        NodeKey::from(format!("{parent}/control:{action}").as_str()),
        NodeKind::Control {
            label: label.to_string(),
        },
    )
}

fn flatten_cycle(cycle: &Cycle, options: &RenderOptions) -> FragmentNode {
    let key = NodeKey::cycle(cycle.id);
    let cycle_band = Band::from_spec(&cycle.color_scale);
    let mut node = section(
        key.clone(),
        Level::Cycle,
        &cycle.name,
        Some(cycle_band),
        options,
    );

    for group in &cycle.children {
        node.children
            .push(flatten_group(group, &key, &cycle.color_scale, options));
    }
    if options.edit_mode {
        node.children.push(control(&key, "add-group", "Add group"));
    }
    node
}

fn flatten_group(
    group: &Group,
    parent: &NodeKey,
    cycle_scale: &str,
    options: &RenderOptions,
) -> FragmentNode {
    let key = parent.child("group", group.id);
    // A group without its own scale shares the cycle's.
    let spec = group
        .color_scale
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(cycle_scale);
    let band = Band::from_spec(spec);
    let mut node = section(key.clone(), Level::Group, &group.name, Some(band.clone()), options);

    push_content(&mut node, group, &key, &band, options);
    for subgroup in &group.subgroups {
        node.children
            .push(flatten_subgroup(subgroup, &key, &band, options));
    }
    if options.edit_mode {
        node.children
            .push(control(&key, "add-subgroup", "Add subgroup"));
    }
    node
}

fn flatten_subgroup(
    subgroup: &Subgroup,
    parent: &NodeKey,
    band: &Band,
    options: &RenderOptions,
) -> FragmentNode {
    let key = parent.child("subgroup", subgroup.id);
    let mut node = section(key.clone(), Level::Subgroup, &subgroup.name, None, options);

    push_content(&mut node, subgroup, &key, band, options);
    for category in &subgroup.categories {
        node.children
            .push(flatten_category(category, &key, band, options));
    }
    node
}

fn flatten_category(
    category: &Category,
    parent: &NodeKey,
    band: &Band,
    options: &RenderOptions,
) -> FragmentNode {
    let key = parent.child("category", category.id);
    let mut node = section(key.clone(), Level::Category, &category.name, None, options);
    push_content(&mut node, category, &key, band, options);
    node
}

/// Appends preparations (if any) and tables, in that order.
fn push_content(
    node: &mut FragmentNode,
    content: &impl NodeContent,
    key: &NodeKey,
    band: &Band,
    options: &RenderOptions,
) {
    if let Some(text) = content.preparations().filter(|t| !t.is_blank()) {
        node.children.push(FragmentNode::new(
            NodeKey::from(format!("{key}/preparations").as_str()),
            NodeKind::Preparations(text.clone()),
        ));
    }
    for table in content.tables() {
        let table_key = key.child("table", table.id);
        let mut table_node = FragmentNode::new(
            table_key.clone(),
            NodeKind::Table(table_block(table, band)),
        );
        table_node.visible = !options.collapsed.contains(&table_key);
        if options.edit_mode {
            table_node
                .children
                .push(control(&table_key, "edit", "Edit table"));
        }
        node.children.push(table_node);
    }
}

/// Reduces a table to its text grid. Rows and cells are read as-is, never repaired.
fn table_block(table: &Table, enclosing: &Band) -> TableBlock {
    let band = match table.color_scale.as_deref().map(str::trim) {
        Some(spec) if !spec.is_empty() => Band::from_spec(spec),
        _ => enclosing.clone(),
    };
    TableBlock {
        name: table.name.clone(),
        band,
        column_count: table.column_count,
        rows: table
            .rows
            .iter()
            .map(|row| row.cells.iter().map(|cell| cell.content.clone()).collect())
            .collect(),
    }
}

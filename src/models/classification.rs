use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::rich_text::RichText;
use crate::models::table::Table;

/// Parses a classification tree as the editor stores it: a JSON array of cycles.
///
/// # Errors
///
/// Returns `ExportError::Json` when the text is not a valid tree.
pub fn parse_tree(json: &str) -> Result<Vec<Cycle>> {
    Ok(serde_json::from_str(json)?)
}

/// Top level of the drug classification hierarchy.
/// A cycle is the unit the user selects for export; every cycle becomes one fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    /// Numeric id, unique among cycles.
    pub id: u32,
    /// Display name shown in the cycle header band.
    pub name: String,
    /// Gradient spec for the header band (e.g. `"from-indigo-500 via-purple-500 to-pink-500"`).
    #[serde(default)]
    pub color_scale: String,
    /// Groups in display order.
    #[serde(default, alias = "groups")]
    pub children: Vec<Group>,
}

/// Second level: a pharmacological group inside a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Numeric id, unique among the groups of its cycle.
    pub id: u32,
    pub name: String,
    /// Own gradient spec. When absent the band inherits the cycle's scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scale: Option<String>,
    /// Free-form list of preparations, stored as trusted markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparations_html: Option<RichText>,
    #[serde(default)]
    pub subgroups: Vec<Subgroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<Table>>,
}

/// Third level: a subgroup inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgroup {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparations_html: Option<RichText>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<Table>>,
}

/// Leaf level: a category inside a subgroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparations_html: Option<RichText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<Table>>,
}

/// Shared read access to the optional content every level below a cycle can carry.
pub trait NodeContent {
    fn preparations(&self) -> Option<&RichText>;
    fn tables(&self) -> &[Table];
}

impl NodeContent for Group {
    fn preparations(&self) -> Option<&RichText> {
        self.preparations_html.as_ref()
    }

    fn tables(&self) -> &[Table] {
        self.tables.as_deref().unwrap_or_default()
    }
}

impl NodeContent for Subgroup {
    fn preparations(&self) -> Option<&RichText> {
        self.preparations_html.as_ref()
    }

    fn tables(&self) -> &[Table] {
        self.tables.as_deref().unwrap_or_default()
    }
}

impl NodeContent for Category {
    fn preparations(&self) -> Option<&RichText> {
        self.preparations_html.as_ref()
    }

    fn tables(&self) -> &[Table] {
        self.tables.as_deref().unwrap_or_default()
    }
}

impl Cycle {
    /// Counts groups, subgroups, categories and tables reachable from this cycle.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            cycles: 1,
            ..TreeStats::default()
        };
        for group in &self.children {
            stats.groups += 1;
            stats.tables += group.tables().len();
            for subgroup in &group.subgroups {
                stats.subgroups += 1;
                stats.tables += subgroup.tables().len();
                for category in &subgroup.categories {
                    stats.categories += 1;
                    stats.tables += category.tables().len();
                }
            }
        }
        stats
    }
}

/// Node counts of a (sub)tree, used for logging and the print service status report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub cycles: usize,
    pub groups: usize,
    pub subgroups: usize,
    pub categories: usize,
    pub tables: usize,
}

impl std::ops::Add for TreeStats {
    type Output = TreeStats;

    fn add(self, other: TreeStats) -> TreeStats {
        TreeStats {
            cycles: self.cycles + other.cycles,
            groups: self.groups + other.groups,
            subgroups: self.subgroups + other.subgroups,
            categories: self.categories + other.categories,
            tables: self.tables + other.tables,
        }
    }
}

impl std::iter::Sum for TreeStats {
    fn sum<I: Iterator<Item = TreeStats>>(iter: I) -> TreeStats {
        iter.fold(TreeStats::default(), |acc, s| acc + s)
    }
}

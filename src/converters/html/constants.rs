//! Defines constants used throughout the HTML conversion process.

// Class names shared by the renderer, the print stylesheet and content detection.
pub const CYCLE_CLASS: &str = "cycle-section";
pub const GROUP_CLASS: &str = "group-section";
pub const SUBGROUP_CLASS: &str = "subgroup-section";
pub const CATEGORY_CLASS: &str = "category-section";
pub const TABLE_CLASS: &str = "data-table";
pub const CONTROL_CLASS: &str = "edit-control";
pub const NO_DATA_CLASS: &str = "no-data";

/// Label of the placeholder row rendered for tables without rows.
pub const NO_DATA_LABEL: &str = "No data";

/// Inline style marking a hard page-break boundary before a cycle section.
pub const PAGE_BREAK_STYLE: &str = "break-before: page; page-break-before: always;";

/// Styles that force every collapsed region open, keep table display roles and
/// hide UI controls. Embedded in every exported document.
pub const PRINT_STYLESHEET: &str = r#"
[data-collapsed], [hidden] {
  display: block !important;
  visibility: visible !important;
  opacity: 1 !important;
  height: auto !important;
  max-height: none !important;
  overflow: visible !important;
}
table, table[data-collapsed], table[hidden] { display: table !important; }
thead { display: table-header-group !important; }
tbody { display: table-row-group !important; }
tr, tr[data-collapsed], tr[hidden] { display: table-row !important; }
td, th, td[data-collapsed], td[hidden] { display: table-cell !important; }
.edit-control, [data-control], button { display: none !important; }
* {
  -webkit-print-color-adjust: exact !important;
  print-color-adjust: exact !important;
}
.cycle-section + .cycle-section { break-before: page; page-break-before: always; }
.group-section, .table-block { break-inside: avoid-page; }
"#;

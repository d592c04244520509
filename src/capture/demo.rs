use crate::models::classification::{Category, Cycle, Group, Subgroup};
use crate::models::rich_text::RichText;
use crate::models::table::Table;

/// A fixed sample classification, used by the HTML download when there is no
/// live content to serialize.
pub fn demo_tree() -> Vec<Cycle> {
    let mut dosage = Table::from_rows(
        1,
        "Usual adult dosage",
        [
            ["Amoxicillin", "500 mg", "every 8 h"],
            ["Ampicillin", "1 g", "every 6 h"],
        ],
    );
    dosage.color_scale = Some("sky-100".to_string());

    vec![Cycle {
        id: 1,
        name: "Antimicrobial agents".to_string(),
        color_scale: "from-sky-600 via-blue-700 to-indigo-800".to_string(),
        children: vec![
            Group {
                id: 1,
                name: "Beta-lactam antibiotics".to_string(),
                color_scale: Some("from-emerald-100 to-teal-100".to_string()),
                preparations_html: Some(RichText::from(
                    "<ul><li><b>Amoxicillin</b> (oral)</li><li>Cefazolin (<i>parenteral</i>)</li></ul>",
                )),
                subgroups: vec![Subgroup {
                    id: 1,
                    name: "Penicillins".to_string(),
                    preparations_html: None,
                    categories: vec![Category {
                        id: 1,
                        name: "Aminopenicillins".to_string(),
                        preparations_html: Some(RichText::from("<p>Broad-spectrum penicillins.</p>")),
                        tables: Some(vec![dosage]),
                    }],
                    tables: None,
                }],
                tables: None,
            },
            Group {
                id: 2,
                name: "Macrolides".to_string(),
                color_scale: None,
                preparations_html: None,
                subgroups: vec![],
                tables: Some(vec![Table::empty(1, "Interactions", 2)]),
            },
        ],
    }]
}

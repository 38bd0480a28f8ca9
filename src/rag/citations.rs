use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::document::{CONDITION_NAME, PART, SUBSECTION};
use super::index::RetrievedNode;

pub const UNKNOWN_CONDITION: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub condition: String,
    pub context: String,
    pub links: Vec<String>,
}

impl Citation {
    fn from_node(condition: String, node: &RetrievedNode) -> Self {
        let chunk = &node.chunk;
        Self {
            condition,
            context: format!(
                "{} > {}",
                chunk.metadata_str(PART).unwrap_or_default(),
                chunk.metadata_str(SUBSECTION).unwrap_or_default()
            ),
            links: chunk.related_links(),
        }
    }
}

/// One citation per distinct condition name, in first-seen order.
///
/// `nodes` must already be in descending relevance order; later chunks of an
/// already cited condition are skipped.
pub fn collect_citations(nodes: &[RetrievedNode]) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut citations = Vec::new();

    for node in nodes {
        let name = node
            .chunk
            .metadata_str(CONDITION_NAME)
            .unwrap_or(UNKNOWN_CONDITION);
        if seen.insert(name) {
            citations.push(Citation::from_node(name.to_string(), node));
        }
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::document::DocumentChunk;
    use serde_json::{json, Value};

    fn node(metadata: Value, score: f32) -> RetrievedNode {
        RetrievedNode {
            chunk: DocumentChunk {
                full_text: "text".to_string(),
                metadata: metadata.as_object().cloned().unwrap_or_default(),
            },
            score,
        }
    }

    #[test]
    fn duplicate_conditions_keep_first_seen_context() {
        let nodes = vec![
            node(
                json!({
                    "condition_name": "Condition 5",
                    "part": "Part A",
                    "subsection": "5.1",
                    "related_links": ["https://example.org/5a"]
                }),
                0.9,
            ),
            node(
                json!({
                    "condition_name": "Condition 5",
                    "part": "Part B",
                    "subsection": "5.2",
                    "related_links": ["https://example.org/5b"]
                }),
                0.8,
            ),
            node(
                json!({
                    "condition_name": "Condition 7",
                    "part": "Part C",
                    "subsection": "7.1"
                }),
                0.7,
            ),
        ];

        let citations = collect_citations(&nodes);
        assert_eq!(
            citations,
            vec![
                Citation {
                    condition: "Condition 5".to_string(),
                    context: "Part A > 5.1".to_string(),
                    links: vec!["https://example.org/5a".to_string()],
                },
                Citation {
                    condition: "Condition 7".to_string(),
                    context: "Part C > 7.1".to_string(),
                    links: vec![],
                },
            ]
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let citations = collect_citations(&[node(json!({}), 0.1)]);
        assert_eq!(
            citations,
            vec![Citation {
                condition: "Unknown".to_string(),
                context: " > ".to_string(),
                links: vec![],
            }]
        );
    }

    #[test]
    fn chunks_without_names_collapse_into_one_unknown_citation() {
        let nodes = vec![
            node(json!({ "part": "Part 1" }), 0.9),
            node(json!({ "condition_name": "Condition 1" }), 0.8),
            node(json!({ "part": "Part 2" }), 0.7),
        ];
        let names: Vec<_> = collect_citations(&nodes)
            .into_iter()
            .map(|c| c.condition)
            .collect();
        assert_eq!(names, vec!["Unknown", "Condition 1"]);
    }

    #[test]
    fn no_nodes_no_citations() {
        assert!(collect_citations(&[]).is_empty());
    }
}

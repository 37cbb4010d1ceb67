const SAMPLE_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCategory {
    pub key: String,
    pub terms: Vec<String>,
}

impl TermCategory {
    pub fn display_name(&self) -> String {
        match self.key.as_str() {
            "proper_nouns" => "Proper Nouns".to_string(),
            "technical_terms" => "Technical Terms".to_string(),
            "key_concepts" => "Key Concepts".to_string(),
            other => other.replace('_', " "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminologyOverview {
    pub categories: Vec<TermCategory>,
}

impl TerminologyOverview {
    pub fn total(&self) -> usize {
        self.categories.iter().map(|c| c.terms.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TerminologyPanel {
    #[default]
    Closed,
    Loading,
    Loaded(TerminologyOverview),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCategoryView {
    pub name: String,
    pub count: usize,
    pub samples: Vec<String>,
    /// Terms beyond the sample limit.
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TerminologyView {
    #[default]
    Closed,
    Loading,
    Loaded {
        total: usize,
        categories: Vec<TermCategoryView>,
    },
    Failed {
        message: String,
    },
}

impl TerminologyPanel {
    pub fn view(&self) -> TerminologyView {
        match self {
            TerminologyPanel::Closed => TerminologyView::Closed,
            TerminologyPanel::Loading => TerminologyView::Loading,
            TerminologyPanel::Failed(message) => TerminologyView::Failed {
                message: message.clone(),
            },
            TerminologyPanel::Loaded(overview) => TerminologyView::Loaded {
                total: overview.total(),
                categories: overview
                    .categories
                    .iter()
                    .filter(|category| !category.terms.is_empty())
                    .map(|category| TermCategoryView {
                        name: category.display_name(),
                        count: category.terms.len(),
                        samples: category.terms.iter().take(SAMPLE_LIMIT).cloned().collect(),
                        remaining: category.terms.len().saturating_sub(SAMPLE_LIMIT),
                    })
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_capped() {
        let panel = TerminologyPanel::Loaded(TerminologyOverview {
            categories: vec![
                TermCategory {
                    key: "technical_terms".into(),
                    terms: (0..60).map(|i| format!("term{i}")).collect(),
                },
                TermCategory {
                    key: "empty_bucket".into(),
                    terms: Vec::new(),
                },
            ],
        });
        match panel.view() {
            TerminologyView::Loaded { total, categories } => {
                assert_eq!(total, 60);
                assert_eq!(categories.len(), 1);
                assert_eq!(categories[0].name, "Technical Terms");
                assert_eq!(categories[0].samples.len(), 50);
                assert_eq!(categories[0].remaining, 10);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }
}

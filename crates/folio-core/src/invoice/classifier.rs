//! Scores invoice text against the template library.
//!
//! Each template earns the weight of every field whose pattern matches
//! (supplier 4, number 3, total 2, date 1). Zero scores are dropped and the
//! highest remaining score wins, ties going to the template listed first.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::config::ClassificationConfig;
use crate::models::template::{compile_pattern, FieldKind, Template};

/// Score of one template against one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationScore {
    pub template_name: String,
    pub score: u32,
}

/// Result of classifying a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The best template reached the minimum score.
    Matched { template: Template, score: u32 },
    /// No template reached the minimum score. `best_score` is 0 when
    /// nothing matched at all.
    NoMatch { best_score: u32 },
}

impl Classification {
    pub fn template(&self) -> Option<&Template> {
        match self {
            Classification::Matched { template, .. } => Some(template),
            Classification::NoMatch { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Classification::Matched { .. })
    }
}

pub struct TemplateClassifier {
    min_score: u32,
}

impl TemplateClassifier {
    pub fn new(min_score: u32) -> Self {
        Self { min_score }
    }

    pub fn from_config(config: &ClassificationConfig) -> Self {
        Self::new(config.min_score)
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    /// Score a single template. Invalid patterns count as no match.
    pub fn score(&self, text: &str, template: &Template) -> u32 {
        FieldKind::ALL
            .iter()
            .filter_map(|kind| template.pattern(*kind).map(|p| (*kind, p)))
            .filter(|(kind, pattern)| match compile_pattern(*kind, pattern) {
                Ok(regex) => regex.is_match(text).unwrap_or_else(|e| {
                    warn!("Template {:?}: {} pattern gave up on input: {}", template.name, kind.label(), e);
                    false
                }),
                Err(e) => {
                    warn!("Template {:?}: {}", template.name, e);
                    false
                }
            })
            .map(|(kind, _)| kind.weight())
            .sum()
    }

    /// Every nonzero score, highest first. Equal scores keep list order.
    pub fn score_all(&self, text: &str, templates: &[Template]) -> Vec<ClassificationScore> {
        let mut scores: Vec<ClassificationScore> = templates
            .iter()
            .map(|t| ClassificationScore {
                template_name: t.name.clone(),
                score: self.score(text, t),
            })
            .filter(|s| s.score > 0)
            .collect();

        // sort_by is stable
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores
    }

    /// Pick the best template, or report that none reached the threshold.
    pub fn classify(&self, text: &str, templates: &[Template]) -> Classification {
        let mut best: Option<(&Template, u32)> = None;
        for template in templates {
            let score = self.score(text, template);
            debug!("Template {:?} scored {}", template.name, score);
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((template, score));
            }
        }

        match best {
            Some((template, score)) if score >= self.min_score => {
                info!("Classified as {:?} (score {})", template.name, score);
                Classification::Matched {
                    template: template.clone(),
                    score,
                }
            }
            Some((template, score)) => {
                info!(
                    "Best template {:?} scored {}, below minimum {}",
                    template.name, score, self.min_score
                );
                Classification::NoMatch { best_score: score }
            }
            None => {
                info!("No template matched");
                Classification::NoMatch { best_score: 0 }
            }
        }
    }
}

impl Default for TemplateClassifier {
    fn default() -> Self {
        Self::from_config(&ClassificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn supplier_only(name: &str, pattern: &str) -> Template {
        Template::new(name).with_pattern(FieldKind::SupplierName, pattern)
    }

    #[test]
    fn test_tie_goes_to_first_listed() {
        let templates = vec![supplier_only("A", "acme"), supplier_only("B", "trading")];
        let classifier = TemplateClassifier::new(3);

        let result = classifier.classify("ACME Trading", &templates);
        assert_eq!(result.template().map(|t| t.name.as_str()), Some("A"));

        let scores = classifier.score_all("ACME Trading", &templates);
        assert_eq!(
            scores,
            vec![
                ClassificationScore { template_name: "A".into(), score: 4 },
                ClassificationScore { template_name: "B".into(), score: 4 },
            ]
        );
    }

    #[test]
    fn test_weights() {
        let template = Template::new("full")
            .with_pattern(FieldKind::SupplierName, "acme")
            .with_pattern(FieldKind::DocumentNumber, r"INV-\d+")
            .with_pattern(FieldKind::TotalAmount, "total")
            .with_pattern(FieldKind::DocumentDate, r"\d{2}/\d{2}/\d{4}");
        let classifier = TemplateClassifier::new(3);

        assert_eq!(classifier.score("ACME INV-1 Total 01/01/2024", &template), 10);
        assert_eq!(classifier.score("INV-1 01/01/2024", &template), 4);
        assert_eq!(classifier.score("Total", &template), 2);
    }

    #[test]
    fn test_lookahead_pattern_scores() {
        let template = supplier_only("acme", r"acme(?= trading)");
        let classifier = TemplateClassifier::new(3);

        assert_eq!(classifier.score("ACME Trading", &template), 4);
        assert_eq!(classifier.score("ACME Holdings", &template), 0);
    }

    #[test]
    fn test_zero_scores_dropped_and_sorted() {
        let templates = vec![
            Template::new("date").with_pattern(FieldKind::DocumentDate, "2024"),
            Template::new("none").with_pattern(FieldKind::SupplierName, "globex"),
            Template::new("number").with_pattern(FieldKind::DocumentNumber, "INV"),
        ];
        let scores = TemplateClassifier::new(3).score_all("INV 2024", &templates);

        let names: Vec<&str> = scores.iter().map(|s| s.template_name.as_str()).collect();
        assert_eq!(names, vec!["number", "date"]);
    }

    #[test]
    fn test_below_threshold_is_no_match() {
        let templates = vec![Template::new("weak").with_pattern(FieldKind::TotalAmount, "total")];
        let result = TemplateClassifier::new(3).classify("Total: 5", &templates);
        assert_eq!(result, Classification::NoMatch { best_score: 2 });
    }

    #[test]
    fn test_nothing_matches() {
        let templates = vec![supplier_only("A", "acme")];
        let result = TemplateClassifier::new(0).classify("unrelated", &templates);
        assert_eq!(result, Classification::NoMatch { best_score: 0 });
        assert!(!result.is_match());
    }

    #[test]
    fn test_invalid_pattern_scores_nothing() {
        let template = Template::new("bad")
            .with_pattern(FieldKind::SupplierName, "(acme")
            .with_pattern(FieldKind::DocumentNumber, "INV");
        assert_eq!(TemplateClassifier::new(3).score("ACME INV", &template), 3);
    }

    #[test]
    fn test_higher_later_template_wins() {
        let templates = vec![
            Template::new("low").with_pattern(FieldKind::TotalAmount, "total"),
            supplier_only("high", "acme"),
        ];
        let result = TemplateClassifier::new(3).classify("ACME total", &templates);
        assert!(matches!(
            result,
            Classification::Matched { ref template, score: 4 } if template.name == "high"
        ));
    }
}

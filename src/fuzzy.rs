//! Fuzzy comparison of condition values for hierarchy detection.

use std::collections::BTreeSet;

use crate::types::condition::Condition;
use crate::types::field::Field;

/// Confidence scores for the fuzzy matches accepted at `aggressive`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FuzzyConfig {
    /// Parent `example.com`, child `someone@example.com`.
    pub domain_exact: f64,
    /// Parent `example.com`, child `mail.example.com` or an address there.
    pub subdomain: f64,
    /// Parent words are a strict subset of the child's words.
    pub term_superset: f64,
    /// Matches scoring below this are rejected.
    pub min_confidence: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            domain_exact: 0.9,
            subdomain: 0.75,
            term_superset: 0.6,
            min_confidence: 0.5,
        }
    }
}

impl FuzzyConfig {
    #[must_use]
    pub fn domain_exact(mut self, score: f64) -> Self {
        self.domain_exact = score;
        self
    }

    #[must_use]
    pub fn subdomain(mut self, score: f64) -> Self {
        self.subdomain = score;
        self
    }

    #[must_use]
    pub fn term_superset(mut self, score: f64) -> Self {
        self.term_superset = score;
        self
    }

    #[must_use]
    pub fn min_confidence(mut self, threshold: f64) -> Self {
        self.min_confidence = threshold;
        self
    }

    /// Score how well `child` narrows `parent` on `field`, or `None` when
    /// it does not. Only raw text values are compared; equal values are
    /// not a fuzzy match.
    #[must_use]
    pub fn score(&self, field: Field, parent: &Condition, child: &Condition) -> Option<f64> {
        let (p, c) = (parent.as_text()?, child.as_text()?);
        let score = match field {
            Field::From | Field::To => self.domain_score(p, c)?,
            Field::Subject | Field::Has => self.term_score(p, c)?,
            Field::DoesNotHave => return None,
        };
        (score >= self.min_confidence).then_some(score)
    }

    fn domain_score(&self, parent: &str, child: &str) -> Option<f64> {
        let parent = bare_domain(parent)?;
        let child = child.trim().to_ascii_lowercase();
        let (local, domain) = match child.rsplit_once('@') {
            Some((local, domain)) => (local, domain),
            None => ("", child.as_str()),
        };
        if domain == parent {
            (!local.is_empty()).then_some(self.domain_exact)
        } else if domain
            .strip_suffix(parent.as_str())
            .is_some_and(|head| head.ends_with('.'))
        {
            Some(self.subdomain)
        } else {
            None
        }
    }

    fn term_score(&self, parent: &str, child: &str) -> Option<f64> {
        let p = words(parent);
        let c = words(child);
        (!p.is_empty() && p.len() < c.len() && p.is_subset(&c)).then_some(self.term_superset)
    }
}

/// `example.com` or `@example.com`, lowercased; `None` for anything with a
/// local part, spaces or query syntax.
fn bare_domain(text: &str) -> Option<String> {
    let text = text.trim();
    let domain = text.strip_prefix('@').unwrap_or(text);
    let plain = !domain.is_empty()
        && domain.contains('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    plain.then(|| domain.to_ascii_lowercase())
}

fn words(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

//! Frequency report over the harvested tech-stack vocabulary.

use std::collections::HashMap;

use crate::models::record::JobRecord;
use crate::models::source::SearchTerms;

/// Entries containing one of these labels are counted under the label alone,
/// so "Angol (B2)" and "Angol (C1)" both count as "ANGOL".
pub const CANONICAL_LABELS: &[&str] = &["ANGOL"];

#[derive(Debug, Clone, PartialEq)]
pub struct TechCount {
    pub label: String,
    pub count: usize,
    /// Share of all mentions, 0..=100.
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechStackReport {
    /// Every normalized mention in record order.
    pub mentions: Vec<String>,
    /// Most frequent first; ties keep first-seen order.
    pub counts: Vec<TechCount>,
}

impl TechStackReport {
    pub fn top(&self, n: usize) -> &[TechCount] {
        &self.counts[..n.min(self.counts.len())]
    }
}

/// Records whose title mentions both search terms, ignoring case.
pub fn filter_by_title<'a>(records: &'a [JobRecord], terms: &SearchTerms) -> Vec<&'a JobRecord> {
    let primary = terms.primary.to_lowercase();
    let secondary = terms.secondary.to_lowercase();
    records
        .iter()
        .filter(|r| {
            let title = r.title.to_lowercase();
            title.contains(&primary) && title.contains(&secondary)
        })
        .collect()
}

pub fn normalize(tech: &str, canonical: &[&str]) -> String {
    let upper = tech.trim().to_uppercase();
    canonical
        .iter()
        .find(|label| upper.contains(*label))
        .map(|label| label.to_string())
        .unwrap_or(upper)
}

pub fn analyze(records: &[JobRecord], terms: &SearchTerms, canonical: &[&str]) -> TechStackReport {
    let relevant = filter_by_title(records, terms);
    let mentions: Vec<String> = relevant
        .iter()
        .flat_map(|r| r.tech_stack.iter())
        .filter(|tech| !tech.trim().is_empty())
        .map(|tech| normalize(tech, canonical))
        .collect();

    let total = mentions.len();
    let counts: Vec<TechCount> = {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut tallies: Vec<(&str, usize)> = Vec::new();
        for mention in &mentions {
            match index.get(mention.as_str()) {
                Some(&i) => tallies[i].1 += 1,
                None => {
                    index.insert(mention.as_str(), tallies.len());
                    tallies.push((mention.as_str(), 1));
                }
            }
        }
        // Stable sort keeps first-seen order among equal counts.
        tallies.sort_by(|a, b| b.1.cmp(&a.1));

        tallies
            .into_iter()
            .map(|(label, count)| TechCount {
                label: label.to_string(),
                count,
                percent: count as f64 * 100.0 / total as f64,
            })
            .collect()
    };

    tracing::info!(
        "{} of {} record(s) match '{} {}', {total} tech mention(s)",
        relevant.len(),
        records.len(),
        terms.primary,
        terms.secondary
    );

    TechStackReport { mentions, counts }
}

/// Horizontal text bars, one line per entry, scaled to the largest share.
pub fn render_chart(entries: &[TechCount], width: usize) -> String {
    let label_width = entries.iter().map(|e| e.label.chars().count()).max().unwrap_or(0);
    let max = entries.iter().map(|e| e.percent).fold(0.0, f64::max);

    entries
        .iter()
        .map(|e| {
            let bar = if max > 0.0 {
                ((e.percent / max) * width as f64).round() as usize
            } else {
                0
            };
            format!(
                "{:<label_width$}  {:<width$}  {:>6.2}%\n",
                e.label,
                "#".repeat(bar),
                e.percent
            )
        })
        .collect()
}

//! Offline scoring commands.
//!
//! `grocer rank` scores a saved candidate list against a term without
//! touching the network or the store, printing the full breakdown and the
//! reason each excluded candidate was dropped. `grocer rules` shows which
//! rules a term would be scored with. Both exist to tune rule tables.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use grocer_core::filter::{exclusion_reason, Exclusion, FilterContext};
use grocer_core::models::ProductCandidate;
use grocer_core::rules::{CategoryQualityRule, IngredientQualityRule};
use grocer_core::select::SelectionEngine;
use grocer_core::terms::normalize_term;

use crate::app::load_rule_book;
use crate::catalog::parse_products;
use crate::config::Config;

#[derive(Debug, Serialize)]
pub struct RankedRow {
    pub position: usize,
    pub id: String,
    pub description: String,
    pub quality: f64,
    pub relevance: f64,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct ExcludedRow {
    pub position: usize,
    pub id: String,
    pub description: String,
    pub reason: Exclusion,
}

#[derive(Debug, Serialize)]
pub struct RankReport {
    pub term: String,
    pub normalized_term: String,
    /// Id of the ingredient rule applied, if any.
    pub rule: Option<String>,
    pub ranked: Vec<RankedRow>,
    pub excluded: Vec<ExcludedRow>,
}

/// Read candidates from a JSON file holding either a bare array of
/// candidates or a raw catalog products response.
pub fn load_candidates(path: &Path) -> Result<Vec<ProductCandidate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse candidates file: {}", path.display()))?;

    if value.is_array() {
        return serde_json::from_value(value)
            .with_context(|| format!("Invalid candidate list in {}", path.display()));
    }
    Ok(parse_products(&value)?.candidates)
}

pub fn rank_candidates(
    engine: &SelectionEngine,
    term: &str,
    candidates: &[ProductCandidate],
) -> RankReport {
    let normalized = normalize_term(term);
    let rule = engine.rule_for(term);
    let ctx = FilterContext::new(&normalized, rule.map(|r| r.category));

    let ranked = engine
        .rank(term, candidates)
        .into_iter()
        .map(|s| RankedRow {
            position: s.position,
            id: s.candidate.id.clone(),
            description: s.candidate.description.clone(),
            quality: s.quality,
            relevance: s.relevance,
            score: s.score,
        })
        .collect();

    let excluded = candidates
        .iter()
        .enumerate()
        .filter_map(|(position, c)| {
            exclusion_reason(c, &ctx).map(|reason| ExcludedRow {
                position,
                id: c.id.clone(),
                description: c.description.clone(),
                reason,
            })
        })
        .collect();

    RankReport {
        term: term.to_string(),
        normalized_term: normalized,
        rule: rule.map(|r| r.id.clone()),
        ranked,
        excluded,
    }
}

pub fn run_rank(config: &Config, term: &str, file: &Path) -> Result<()> {
    let engine = SelectionEngine::new(load_rule_book(config)?);
    let candidates = load_candidates(file)?;
    let report = rank_candidates(&engine, term, &candidates);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct RuleMatch<'a> {
    term: String,
    ingredient_rule: Option<&'a IngredientQualityRule>,
    category_rule: Option<&'a CategoryQualityRule>,
}

#[derive(Serialize)]
struct RuleSummary<'a> {
    id: &'a str,
    canonical_name: &'a str,
    category: &'static str,
}

/// Show the rules `term` would be scored with, or list every ingredient
/// rule when no term is given.
pub fn run_rules(config: &Config, term: Option<&str>) -> Result<()> {
    let book = load_rule_book(config)?;

    let Some(term) = term else {
        let rules: Vec<RuleSummary<'_>> = book
            .ingredient_rules()
            .iter()
            .map(|r| RuleSummary {
                id: &r.id,
                canonical_name: &r.canonical_name,
                category: r.category.as_str(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    };

    let ingredient_rule = book.find_ingredient_rule(term);
    let category_rule = ingredient_rule.and_then(|r| book.category_rule(r.category));
    let out = RuleMatch {
        term: normalize_term(term),
        ingredient_rule,
        category_rule,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn candidates() -> Vec<ProductCandidate> {
        vec![
            ProductCandidate::new("1", "Purina Chicken Dog Food").with_categories(&["Pet Care"]),
            ProductCandidate::new("2", "Breaded Chicken Breast Nuggets").with_categories(&["Frozen"]),
            ProductCandidate::new("3", "Boneless Skinless Chicken Breast").with_categories(&["Meat & Seafood"]),
        ]
    }

    #[test]
    fn test_rank_report_explains_exclusions() {
        let engine = SelectionEngine::default();
        let report = rank_candidates(&engine, "chicken breast", &candidates());

        assert_eq!(report.ranked[0].id, "3");
        assert_eq!(report.ranked.len(), 2);
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].id, "1");
        assert_eq!(report.excluded[0].reason, Exclusion::PetFood);
    }

    #[test]
    fn test_load_candidates_from_array_and_response() {
        let mut arr = tempfile::NamedTempFile::new().unwrap();
        write!(arr, "{}", serde_json::to_string(&candidates()).unwrap()).unwrap();
        assert_eq!(load_candidates(arr.path()).unwrap().len(), 3);

        let mut resp = tempfile::NamedTempFile::new().unwrap();
        write!(
            resp,
            r#"{{"data":[{{"productId":"9","description":"Large Eggs"}}],"meta":{{"pagination":{{"total":12}}}}}}"#
        )
        .unwrap();
        let loaded = load_candidates(resp.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "9");
    }
}

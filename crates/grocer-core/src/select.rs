//! Candidate selection: filter, score, rank.
//!
//! The engine is a pure function of `(search term, candidate list, rule
//! book)`. It runs every candidate through the hard exclusions in
//! [`filter`](crate::filter), then scores survivors on two axes:
//!
//! - **Quality**: how well the product fits the ingredient, driven by the
//!   matched [`IngredientQualityRule`] and its [`CategoryQualityRule`]
//!   (avoid/prefer keywords, processed-food and freshness signals, stock).
//! - **Relevance**: how well the description answers the literal search
//!   (substring and whole-word hits, grocery department, fruit-vs-vegetable
//!   and beverage intent, short "simple" descriptions).
//!
//! `score = quality * 1.5 + relevance`. Ranking is a stable descending sort,
//! so equal scores keep catalog order.
//!
//! # Best-effort policy
//!
//! [`SelectionEngine::select_best`] returns the top-ranked survivor even when
//! every score is ≤ 0. A `Some` result means "the best the catalog offered",
//! not "a good match". Callers that need a quality floor must check
//! [`ScoredCandidate::score`] themselves via [`SelectionEngine::rank`].

use serde::Serialize;

use crate::filter::{exclusion_for, CandidateText, FilterContext};
use crate::models::{ProductCandidate, STOCK_HIGH, STOCK_LOW};
use crate::rules::{CategoryQualityRule, FoodCategory, IngredientQualityRule, RuleBook};
use crate::terms::{contains_word, normalize_term, tokens};

const QUALITY_WEIGHT: f64 = 1.5;

const AVOID_PENALTY: f64 = -50.0;
const INGREDIENT_AVOID_PENALTY: f64 = -20.0;
const PREFER_BONUS: f64 = 8.0;
const CATEGORY_PREFER_BONUS: f64 = 4.0;
const FRESH_PRODUCE_BONUS: f64 = 15.0;
const FRESH_WORD_BONUS: f64 = 10.0;
const PROCESSED_PENALTY: f64 = -15.0;
const FROZEN_PENALTY: f64 = -12.0;
const RAW_WHOLE_BONUS: f64 = 8.0;
const HIGH_STOCK_BONUS: f64 = 3.0;
const LOW_STOCK_PENALTY: f64 = -2.0;

const SUBSTRING_BONUS: f64 = 5.0;
const WHOLE_WORD_BONUS: f64 = 3.0;
const DEPARTMENT_BONUS: f64 = 4.0;
const FRUIT_VEG_MISMATCH_PENALTY: f64 = -50.0;
const BEVERAGE_PENALTY: f64 = -10.0;
const SHORT_DESCRIPTION_BONUS: f64 = 2.0;
const SHORT_DESCRIPTION_WORDS: usize = 4;

const PROCESSED_INDICATORS: &[&str] = &[
    "breaded",
    "battered",
    "sauced",
    "in sauce",
    "nugget",
    "tempura",
    "fritter",
    "popcorn",
    "crispy",
    "glazed",
    "stuffed",
    "meal kit",
    "dinner kit",
    "microwave",
    "ready to eat",
    "fully cooked",
];

const RAW_WHOLE_INDICATORS: &[&str] = &["raw", "whole", "per lb", "/lb", "by the pound", "loose"];

const GROCERY_DEPARTMENTS: &[&str] = &[
    "produce",
    "meat & seafood",
    "meat",
    "seafood",
    "dairy",
    "dairy & eggs",
    "bakery",
    "deli",
    "pantry",
    "canned & packaged",
    "canned goods",
    "baking goods",
    "baking",
    "breakfast",
    "condiment & sauces",
    "condiments",
    "spices",
    "herbs & spices",
    "frozen",
    "international",
    "natural & organic",
    "pasta, sauces, grain",
    "oils",
    "dry goods",
    "snacks",
];

const BEVERAGE_CATEGORIES: &[&str] = &["beverages", "beverage", "drinks", "soft drinks", "juice"];
const BEVERAGE_WORDS: &[&str] = &[
    "juice", "drink", "soda", "beverage", "tea", "coffee", "water", "smoothie", "lemonade",
    "milk", "kombucha", "cider",
];

const FRUIT_WORDS: &[&str] = &[
    "apple", "banana", "berry", "berries", "strawberry", "blueberry", "raspberry", "orange",
    "lemon", "lime", "grape", "peach", "pear", "plum", "mango", "pineapple", "melon",
    "watermelon", "cherry", "kiwi", "cantaloupe", "apricot", "nectarine", "fruit",
];
const VEGETABLE_WORDS: &[&str] = &[
    "onion", "garlic", "pepper", "tomato", "carrot", "celery", "broccoli", "spinach",
    "lettuce", "kale", "cucumber", "zucchini", "squash", "mushroom", "potato", "cabbage",
    "cauliflower", "asparagus", "beet", "radish", "corn", "pea", "bean", "vegetable",
    "veggie",
];

/// What the shopper is looking for, in the coarse fruit/vegetable sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProduceIntent {
    Vegetable,
    Fruit,
    Other,
}

fn has_any_token(toks: &[String], words: &[&str]) -> bool {
    toks.iter().any(|t| {
        words
            .iter()
            .any(|w| t == w || (t.len() == w.len() + 1 && t.ends_with('s') && t.starts_with(w)))
    })
}

fn count_matches(text: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|k| !k.is_empty() && text.contains(k.as_str()))
        .count()
}

/// Precomputed, search-level inputs to scoring.
struct SearchProfile<'r> {
    normalized: String,
    term_tokens: Vec<String>,
    rule: Option<&'r IngredientQualityRule>,
    category_rule: Option<&'r CategoryQualityRule>,
    filter: FilterContext,
    intent: ProduceIntent,
    wants_beverage: bool,
    wants_frozen: bool,
}

impl<'r> SearchProfile<'r> {
    fn new(term: &str, rules: &'r RuleBook) -> Self {
        let normalized = normalize_term(term);
        let term_tokens = tokens(&normalized);
        let rule = rules.find_ingredient_rule(&normalized);
        let category = rule.map(|r| r.category);
        let category_rule = category.and_then(|c| rules.category_rule(c));
        let intent = match category {
            Some(FoodCategory::Produce) => ProduceIntent::Vegetable,
            Some(FoodCategory::Fruits) => ProduceIntent::Fruit,
            Some(_) => ProduceIntent::Other,
            None if has_any_token(&term_tokens, FRUIT_WORDS) => ProduceIntent::Fruit,
            None if has_any_token(&term_tokens, VEGETABLE_WORDS) => ProduceIntent::Vegetable,
            None => ProduceIntent::Other,
        };
        Self {
            filter: FilterContext::new(&normalized, category),
            wants_beverage: has_any_token(&term_tokens, BEVERAGE_WORDS)
                || category == Some(FoodCategory::Beverages),
            wants_frozen: term_tokens.iter().any(|t| t == "frozen"),
            normalized,
            term_tokens,
            rule,
            category_rule,
            intent,
        }
    }
}

/// A surviving candidate with its score breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a ProductCandidate,
    /// Position in the catalog response, used as the tie-breaker.
    pub position: usize,
    pub quality: f64,
    pub relevance: f64,
    pub score: f64,
}

/// Filters and ranks catalog candidates against a search term.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    rules: RuleBook,
}

impl SelectionEngine {
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Candidates passing every hard exclusion, in catalog order.
    pub fn filter<'a>(&self, term: &str, candidates: &'a [ProductCandidate]) -> Vec<&'a ProductCandidate> {
        let profile = SearchProfile::new(term, &self.rules);
        candidates
            .iter()
            .filter(|c| exclusion_for(c, &CandidateText::of(c), &profile.filter).is_none())
            .collect()
    }

    /// Filter, score and sort. Highest score first; ties keep catalog order.
    pub fn rank<'a>(&self, term: &str, candidates: &'a [ProductCandidate]) -> Vec<ScoredCandidate<'a>> {
        let profile = SearchProfile::new(term, &self.rules);
        let mut scored: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .enumerate()
            .filter_map(|(position, c)| {
                let text = CandidateText::of(c);
                if exclusion_for(c, &text, &profile.filter).is_some() {
                    return None;
                }
                let quality = quality_score(c, &text, &profile);
                let relevance = relevance_score(&text, &profile);
                Some(ScoredCandidate {
                    candidate: c,
                    position,
                    quality,
                    relevance,
                    score: quality * QUALITY_WEIGHT + relevance,
                })
            })
            .collect();

        // `sort_by` is stable; the position tie-break makes that explicit.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        scored
    }

    /// The best surviving candidate, even if its score is not positive.
    pub fn select_best<'a>(&self, term: &str, candidates: &'a [ProductCandidate]) -> Option<&'a ProductCandidate> {
        self.rank(term, candidates).first().map(|s| s.candidate)
    }

    /// The top `n` surviving candidates.
    pub fn select_top<'a>(
        &self,
        term: &str,
        candidates: &'a [ProductCandidate],
        n: usize,
    ) -> Vec<&'a ProductCandidate> {
        self.rank(term, candidates)
            .into_iter()
            .take(n)
            .map(|s| s.candidate)
            .collect()
    }

    /// The ingredient rule that would be used for `term`.
    pub fn rule_for(&self, term: &str) -> Option<&IngredientQualityRule> {
        self.rules.find_ingredient_rule(term)
    }
}

fn quality_score(c: &ProductCandidate, text: &CandidateText, profile: &SearchProfile<'_>) -> f64 {
    let desc = text.description.as_str();
    let mut score = 0.0;

    let ingredient_avoid = profile
        .rule
        .map_or(0, |r| count_matches(desc, &r.avoid_keywords));
    let category_avoid = profile
        .category_rule
        .map_or(0, |r| count_matches(desc, &r.avoid_keywords));
    if ingredient_avoid + category_avoid > 0 {
        score += AVOID_PENALTY;
    }
    score += INGREDIENT_AVOID_PENALTY * ingredient_avoid as f64;

    if let Some(rule) = profile.rule {
        score += PREFER_BONUS * count_matches(desc, &rule.prefer_attributes) as f64;
    }
    if let Some(cat) = profile.category_rule {
        score += CATEGORY_PREFER_BONUS * count_matches(desc, &cat.prefer_keywords) as f64;
    }

    let frozen = desc.contains("frozen") || text.categories.iter().any(|c| c == "frozen");
    let fresh_produce = text.is_fresh_produce();
    if fresh_produce && !frozen {
        score += FRESH_PRODUCE_BONUS;
    }
    if desc.contains("fresh") {
        score += FRESH_WORD_BONUS;
    }

    score += PROCESSED_PENALTY
        * PROCESSED_INDICATORS
            .iter()
            .filter(|p| desc.contains(*p))
            .count() as f64;

    // Frozen vegetables stocked under produce, or an explicit "frozen" search,
    // are not penalized.
    if frozen && !fresh_produce && !profile.wants_frozen {
        score += FROZEN_PENALTY;
    }

    let by_weight = c
        .sold_by
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("weight"));
    if by_weight || RAW_WHOLE_INDICATORS.iter().any(|w| contains_word(desc, w) || (w.starts_with('/') && desc.contains(w))) {
        score += RAW_WHOLE_BONUS;
    }

    match c.stock_level.as_deref() {
        Some(STOCK_HIGH) => score += HIGH_STOCK_BONUS,
        Some(STOCK_LOW) => score += LOW_STOCK_PENALTY,
        _ => {}
    }

    score
}

fn relevance_score(text: &CandidateText, profile: &SearchProfile<'_>) -> f64 {
    let desc = text.description.as_str();
    let mut score = 0.0;

    if !profile.normalized.is_empty() && desc.contains(profile.normalized.as_str()) {
        score += SUBSTRING_BONUS;
    }
    if !profile.term_tokens.is_empty()
        && profile.term_tokens.iter().all(|t| contains_word(desc, t))
    {
        score += WHOLE_WORD_BONUS;
    }
    if text.has_category(GROCERY_DEPARTMENTS) {
        score += DEPARTMENT_BONUS;
    }

    let desc_tokens = tokens(desc);
    let looks_like_fruit = text.categories.iter().any(|c| c.contains("fruit"))
        || has_any_token(&desc_tokens, FRUIT_WORDS);
    let looks_like_vegetable = text.categories.iter().any(|c| c.contains("vegetable"))
        || has_any_token(&desc_tokens, VEGETABLE_WORDS);
    let mismatch = match profile.intent {
        ProduceIntent::Vegetable => looks_like_fruit && !looks_like_vegetable,
        ProduceIntent::Fruit => looks_like_vegetable && !looks_like_fruit,
        ProduceIntent::Other => false,
    };
    if mismatch {
        score += FRUIT_VEG_MISMATCH_PENALTY;
    }

    let is_beverage = text.has_category(BEVERAGE_CATEGORIES)
        || ["drink", "soda", "beverage", "juice drink"]
            .iter()
            .any(|w| contains_word(desc, w));
    if is_beverage && !profile.wants_beverage {
        score += BEVERAGE_PENALTY;
    }

    if desc_tokens.len() <= SHORT_DESCRIPTION_WORDS {
        score += SHORT_DESCRIPTION_BONUS;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::STOCK_OUT;

    fn engine() -> SelectionEngine {
        SelectionEngine::default()
    }

    #[test]
    fn test_boneless_skinless_beats_breaded() {
        let candidates = vec![
            ProductCandidate::new("breaded", "Breaded Chicken Breast Tenders"),
            ProductCandidate::new("plain", "Boneless Skinless Chicken Breast"),
        ];
        let ranked = engine().rank("chicken breast", &candidates);
        assert_eq!(ranked[0].candidate.id, "plain");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_all_negative_still_returns_best() {
        let candidates = vec![
            ProductCandidate::new("a", "Breaded Chicken Breast Nuggets Frozen Meal Kit"),
            ProductCandidate::new("b", "Breaded Chicken Breast Tenders"),
        ];
        let ranked = engine().rank("chicken breast", &candidates);
        assert!(ranked.iter().all(|s| s.score <= 0.0));
        let best = engine().select_best("chicken breast", &candidates).unwrap();
        assert_eq!(best.id, ranked[0].candidate.id);
    }

    #[test]
    fn test_filtered_candidates_never_returned() {
        let candidates = vec![
            ProductCandidate::new("pet", "Chicken Breast Recipe Dog Food").with_brand("Blue Buffalo"),
            ProductCandidate::new("oos", "Boneless Skinless Chicken Breast").with_stock_level(STOCK_OUT),
        ];
        assert!(engine().select_best("chicken breast", &candidates).is_none());
        assert!(engine().select_top("chicken breast", &candidates, 5).is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let candidates = vec![
            ProductCandidate::new("first", "Quinoa"),
            ProductCandidate::new("second", "Quinoa"),
            ProductCandidate::new("third", "Quinoa"),
        ];
        let ids: Vec<&str> = engine()
            .select_top("quinoa", &candidates, 3)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_vegetable_search_penalizes_fruit() {
        let candidates = vec![
            ProductCandidate::new("fruit", "Peach Slices").with_categories(&["Produce"]),
            ProductCandidate::new("veg", "Green Bell Pepper").with_categories(&["Produce"]),
        ];
        let best = engine().select_best("bell pepper", &candidates).unwrap();
        assert_eq!(best.id, "veg");
    }

    #[test]
    fn test_beverage_penalty_unless_requested() {
        let candidates = vec![
            ProductCandidate::new("drink", "Lemon Lime Soda").with_categories(&["Beverages"]),
            ProductCandidate::new("lemon", "Lemons").with_categories(&["Produce"]),
        ];
        assert_eq!(engine().select_best("lemon", &candidates).unwrap().id, "lemon");
    }

    #[test]
    fn test_fresh_produce_preferred_over_frozen() {
        let candidates = vec![
            ProductCandidate::new("frozen", "Frozen Broccoli Florets").with_categories(&["Frozen"]),
            ProductCandidate::new("fresh", "Broccoli Crowns").with_categories(&["Produce"]),
        ];
        assert_eq!(engine().select_best("broccoli", &candidates).unwrap().id, "fresh");
    }

    #[test]
    fn test_garlic_powder_skips_fresh_garlic() {
        let candidates = vec![
            ProductCandidate::new("bulb", "Fresh Garlic Bulb").with_categories(&["Produce"]),
            ProductCandidate::new("jar", "Garlic Powder").with_categories(&["Spices"]),
        ];
        let ranked = engine().rank("garlic powder", &candidates);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.id, "jar");
    }

    #[test]
    fn test_select_top_limits() {
        let candidates: Vec<ProductCandidate> = (0..10)
            .map(|i| ProductCandidate::new(format!("{}", i), "Large Eggs"))
            .collect();
        assert_eq!(engine().select_top("eggs", &candidates, 3).len(), 3);
        assert_eq!(engine().select_top("eggs", &candidates, 0).len(), 0);
    }

    #[test]
    fn test_stock_level_breaks_otherwise_equal() {
        let candidates = vec![
            ProductCandidate::new("low", "Large Eggs").with_stock_level(STOCK_LOW),
            ProductCandidate::new("high", "Large Eggs").with_stock_level(STOCK_HIGH),
        ];
        assert_eq!(engine().select_best("eggs", &candidates).unwrap().id, "high");
    }
}

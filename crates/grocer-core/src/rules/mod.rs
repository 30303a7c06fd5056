//! Ingredient and category quality rules.
//!
//! A [`RuleBook`] is a pair of plain, immutable tables built once at process
//! start: ingredient rules (many-to-one from free text to a canonical
//! ingredient) and coarse category rules shared by every ingredient in that
//! category. A product may be scored under both at once.
//!
//! # Rule lookup
//!
//! [`RuleBook::find_ingredient_rule`] is a linear scan picking the rule whose
//! keyword is the **longest** substring of the normalized term, so the
//! `"lemon juice"` rule beats the `"lemon"` rule for `"fresh lemon juice"`.
//! Equal-length matches keep the earlier rule. At a few hundred rules a trie
//! buys nothing.

mod categories;
mod ingredients;

use serde::{Deserialize, Serialize};

use crate::terms::normalize_term;

/// Coarse food category an ingredient rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Protein,
    Dairy,
    Carb,
    Produce,
    FatsOils,
    Snacks,
    Beans,
    Fruits,
    Eggs,
    Pantry,
    Spices,
    Condiments,
    Beverages,
}

impl FoodCategory {
    /// Shelf-stable categories for which fresh produce is never a valid match
    /// ("garlic powder" must not surface a bulb of garlic).
    pub fn is_pantry_like(self) -> bool {
        matches!(
            self,
            FoodCategory::Pantry | FoodCategory::Spices | FoodCategory::Condiments
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FoodCategory::Protein => "protein",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Carb => "carb",
            FoodCategory::Produce => "produce",
            FoodCategory::FatsOils => "fats_oils",
            FoodCategory::Snacks => "snacks",
            FoodCategory::Beans => "beans",
            FoodCategory::Fruits => "fruits",
            FoodCategory::Eggs => "eggs",
            FoodCategory::Pantry => "pantry",
            FoodCategory::Spices => "spices",
            FoodCategory::Condiments => "condiments",
            FoodCategory::Beverages => "beverages",
        }
    }
}

/// Per-serving nutrition ceilings and floors.
///
/// Informational: the catalog search response carries no nutrition panel,
/// so these are surfaced by `grocer rules` rather than scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sodium_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sugar_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_saturated_fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fiber_g: Option<f64>,
}

/// Quality rule for one canonical ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientQualityRule {
    pub id: String,
    pub canonical_name: String,
    pub category: FoodCategory,
    pub match_keywords: Vec<String>,
    #[serde(default)]
    pub avoid_keywords: Vec<String>,
    #[serde(default)]
    pub prefer_attributes: Vec<String>,
    #[serde(default)]
    pub nutrition_targets: Option<NutritionTargets>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl IngredientQualityRule {
    /// Length of the longest keyword of this rule contained in `normalized`.
    fn best_keyword_len(&self, normalized: &str) -> Option<usize> {
        self.match_keywords
            .iter()
            .filter(|kw| !kw.is_empty() && normalized.contains(kw.as_str()))
            .map(|kw| kw.len())
            .max()
    }

    pub(crate) fn with_targets(mut self, targets: NutritionTargets) -> Self {
        self.nutrition_targets = Some(targets);
        self
    }

    pub(crate) fn with_note(mut self, note: &str) -> Self {
        self.notes = Some(note.to_string());
        self
    }
}

/// Shared avoid/prefer keywords for a coarse category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryQualityRule {
    pub category: FoodCategory,
    pub avoid_keywords: Vec<String>,
    pub prefer_keywords: Vec<String>,
    #[serde(default)]
    pub nutrition_targets: Option<NutritionTargets>,
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn rule(
    id: &str,
    canonical_name: &str,
    category: FoodCategory,
    match_keywords: &[&str],
    avoid_keywords: &[&str],
    prefer_attributes: &[&str],
) -> IngredientQualityRule {
    IngredientQualityRule {
        id: id.to_string(),
        canonical_name: canonical_name.to_string(),
        category,
        match_keywords: strings(match_keywords),
        avoid_keywords: strings(avoid_keywords),
        prefer_attributes: strings(prefer_attributes),
        nutrition_targets: None,
        notes: None,
    }
}

/// The full set of ingredient and category rules.
#[derive(Debug, Clone)]
pub struct RuleBook {
    ingredients: Vec<IngredientQualityRule>,
    categories: Vec<CategoryQualityRule>,
}

impl RuleBook {
    /// The built-in rule tables.
    pub fn builtin() -> Self {
        Self {
            ingredients: ingredients::builtin_ingredient_rules(),
            categories: categories::builtin_category_rules(),
        }
    }

    /// Build a rule book from explicit tables.
    pub fn new(
        ingredients: Vec<IngredientQualityRule>,
        categories: Vec<CategoryQualityRule>,
    ) -> Self {
        Self {
            ingredients,
            categories,
        }
    }

    /// Prepend extra ingredient rules. Keywords are lowercased so lookups
    /// against normalized terms work regardless of how the file was written.
    pub fn with_extra_rules(mut self, extra: Vec<IngredientQualityRule>) -> Self {
        let mut merged: Vec<IngredientQualityRule> = extra
            .into_iter()
            .map(|mut r| {
                r.match_keywords = r.match_keywords.iter().map(|k| normalize_term(k)).collect();
                r.avoid_keywords = r.avoid_keywords.iter().map(|k| k.to_lowercase()).collect();
                r.prefer_attributes = r.prefer_attributes.iter().map(|k| k.to_lowercase()).collect();
                r
            })
            .collect();
        merged.append(&mut self.ingredients);
        self.ingredients = merged;
        self
    }

    pub fn ingredient_rules(&self) -> &[IngredientQualityRule] {
        &self.ingredients
    }

    pub fn category_rules(&self) -> &[CategoryQualityRule] {
        &self.categories
    }

    /// Find the ingredient rule with the longest keyword contained in `term`.
    pub fn find_ingredient_rule(&self, term: &str) -> Option<&IngredientQualityRule> {
        let normalized = normalize_term(term);
        let mut best: Option<(&IngredientQualityRule, usize)> = None;
        for r in &self.ingredients {
            if let Some(len) = r.best_keyword_len(&normalized) {
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((r, len));
                }
            }
        }
        best.map(|(r, _)| r)
    }

    pub fn category_rule(&self, category: FoodCategory) -> Option<&CategoryQualityRule> {
        self.categories.iter().find(|c| c.category == category)
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_keyword_wins() {
        let book = RuleBook::builtin();
        let r = book.find_ingredient_rule("fresh lemon juice").unwrap();
        assert_eq!(r.id, "lemon_juice");
        let r = book.find_ingredient_rule("lemon").unwrap();
        assert_eq!(r.id, "lemon");
    }

    #[test]
    fn test_garlic_powder_is_spice() {
        let book = RuleBook::builtin();
        let r = book.find_ingredient_rule("Garlic Powder").unwrap();
        assert_eq!(r.category, FoodCategory::Spices);
        let r = book.find_ingredient_rule("3 cloves garlic").unwrap();
        assert_eq!(r.category, FoodCategory::Produce);
    }

    #[test]
    fn test_no_rule_for_unknown_term() {
        let book = RuleBook::builtin();
        assert!(book.find_ingredient_rule("xyzzy").is_none());
    }

    #[test]
    fn test_every_core_category_has_a_rule() {
        let book = RuleBook::builtin();
        for cat in [
            FoodCategory::Protein,
            FoodCategory::Dairy,
            FoodCategory::Carb,
            FoodCategory::Produce,
            FoodCategory::FatsOils,
            FoodCategory::Snacks,
            FoodCategory::Beans,
            FoodCategory::Fruits,
            FoodCategory::Eggs,
        ] {
            assert!(book.category_rule(cat).is_some(), "missing {:?}", cat);
        }
        assert!(book.category_rule(FoodCategory::Spices).is_none());
    }

    #[test]
    fn test_extra_rules_take_precedence_on_equal_length() {
        let extra = vec![rule(
            "house_onion",
            "house onion",
            FoodCategory::Produce,
            &["Onion"],
            &[],
            &["sweet"],
        )];
        let book = RuleBook::builtin().with_extra_rules(extra);
        assert_eq!(book.find_ingredient_rule("onion").unwrap().id, "house_onion");
    }

    #[test]
    fn test_builtin_ids_unique() {
        let book = RuleBook::builtin();
        let mut ids: Vec<&str> = book.ingredient_rules().iter().map(|r| r.id.as_str()).collect();
        let n = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n);
    }
}

//! Hard exclusions applied before any scoring.
//!
//! A candidate is dropped, regardless of how well it would score, when it
//! shows pet-food signals, non-food household/personal-care/pharmacy
//! signals, baby/toddler-food signals (unless the search itself asks for
//! baby food), is reported out of stock, or is fresh produce while the
//! resolved ingredient is a pantry/spice item.
//!
//! Each check is independent, so the order they run in does not matter;
//! [`exclusion_reason`] reports the first one that fires.

use serde::Serialize;

use crate::models::ProductCandidate;
use crate::rules::FoodCategory;

const PET_BRANDS: &[&str] = &[
    "purina",
    "pedigree",
    "friskies",
    "meow mix",
    "fancy feast",
    "blue buffalo",
    "milk-bone",
    "milk bone",
    "greenies",
    "temptations",
    "nutrish",
    "beneful",
    "kibbles",
    "cesar",
    "sheba",
    "9lives",
    "rachael ray nutrish",
    "hill's science diet",
];

const PET_KEYWORDS: &[&str] = &[
    "dog food",
    "cat food",
    "pet food",
    "dog treat",
    "cat treat",
    "dog chew",
    "for dogs",
    "for cats",
    "kitten",
    "puppy",
    "canine",
    "feline",
    "cat litter",
    "bird seed",
    "birdseed",
    "rawhide",
    "wet dog",
    "dry dog",
    "wet cat",
    "dry cat",
];

const PET_CATEGORIES: &[&str] = &["pet care", "pet supplies", "pet", "pets", "dog", "cat"];

const NON_FOOD_KEYWORDS: &[&str] = &[
    "detergent",
    "cleaner",
    "bleach",
    "disinfect",
    "paper towel",
    "toilet paper",
    "bath tissue",
    "napkins",
    "trash bag",
    "shampoo",
    "conditioner",
    "body wash",
    "toothpaste",
    "mouthwash",
    "deodorant",
    "lotion",
    "sunscreen",
    "hand soap",
    "dish soap",
    "bar soap",
    "candle",
    "air freshener",
    "diaper",
    "wipes",
    "supplement",
    "multivitamin",
    "pain reliever",
    "antacid",
    "allergy relief",
    "cough",
    "lip balm",
    "cosmetic",
    "batteries",
    "charcoal briquets",
];

const NON_FOOD_CATEGORIES: &[&str] = &[
    "household",
    "cleaning",
    "cleaning products",
    "laundry",
    "paper products",
    "personal care",
    "health & beauty",
    "health and beauty",
    "beauty",
    "pharmacy",
    "health",
    "health care",
    "vitamins",
    "baby care",
    "kitchen supplies",
    "home decor",
];

const BABY_KEYWORDS: &[&str] = &[
    "baby food",
    "toddler",
    "infant",
    "stage 1",
    "stage 2",
    "stage 3",
    "puffs for baby",
    "teething",
    "gerber",
    "beech-nut",
    "happy baby",
    "happy tot",
    "plum organics",
    "little ones",
    "sprout organics",
    "once upon a farm",
];

const BABY_CATEGORIES: &[&str] = &["baby", "baby food", "baby & toddler", "infant formula"];

/// Search phrases meaning the user actually wants baby products.
const BABY_INTENT: &[&str] = &["baby food", "toddler", "infant", "formula", "baby puree"];

const PRODUCE_CATEGORY: &str = "produce";

/// Why a candidate was removed from consideration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    PetFood,
    NonFood,
    BabyFood,
    OutOfStock,
    FreshProduceForPantryItem,
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Exclusion::PetFood => "pet food",
            Exclusion::NonFood => "non-food item",
            Exclusion::BabyFood => "baby food",
            Exclusion::OutOfStock => "out of stock",
            Exclusion::FreshProduceForPantryItem => "fresh produce for a pantry item",
        };
        f.write_str(s)
    }
}

/// Search-side facts the filter depends on, computed once per search.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    pub wants_baby_food: bool,
    pub rule_category: Option<FoodCategory>,
}

impl FilterContext {
    pub fn new(normalized_term: &str, rule_category: Option<FoodCategory>) -> Self {
        Self {
            wants_baby_food: BABY_INTENT.iter().any(|p| normalized_term.contains(p)),
            rule_category,
        }
    }
}

/// Lowercased views of a candidate's text fields.
pub(crate) struct CandidateText {
    pub description: String,
    pub brand: String,
    pub categories: Vec<String>,
}

impl CandidateText {
    pub(crate) fn of(c: &ProductCandidate) -> Self {
        Self {
            description: c.description.to_lowercase(),
            brand: c.brand.as_deref().unwrap_or_default().to_lowercase(),
            categories: c.categories.iter().map(|s| s.trim().to_lowercase()).collect(),
        }
    }

    pub(crate) fn has_category(&self, names: &[&str]) -> bool {
        self.categories.iter().any(|c| names.contains(&c.as_str()))
    }

    pub(crate) fn is_fresh_produce(&self) -> bool {
        self.categories.iter().any(|c| c == PRODUCE_CATEGORY)
    }
}

fn any_in(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Report the exclusion that removes `candidate`, if any.
pub fn exclusion_reason(candidate: &ProductCandidate, ctx: &FilterContext) -> Option<Exclusion> {
    exclusion_for(candidate, &CandidateText::of(candidate), ctx)
}

pub(crate) fn exclusion_for(
    candidate: &ProductCandidate,
    text: &CandidateText,
    ctx: &FilterContext,
) -> Option<Exclusion> {
    if any_in(&text.brand, PET_BRANDS)
        || any_in(&text.description, PET_BRANDS)
        || any_in(&text.description, PET_KEYWORDS)
        || text.has_category(PET_CATEGORIES)
    {
        return Some(Exclusion::PetFood);
    }
    if any_in(&text.description, NON_FOOD_KEYWORDS) || text.has_category(NON_FOOD_CATEGORIES) {
        return Some(Exclusion::NonFood);
    }
    if !ctx.wants_baby_food
        && (any_in(&text.description, BABY_KEYWORDS)
            || any_in(&text.brand, BABY_KEYWORDS)
            || text.has_category(BABY_CATEGORIES))
    {
        return Some(Exclusion::BabyFood);
    }
    if !candidate.is_available() {
        return Some(Exclusion::OutOfStock);
    }
    if ctx.rule_category.is_some_and(FoodCategory::is_pantry_like) && text.is_fresh_produce() {
        return Some(Exclusion::FreshProduceForPantryItem);
    }
    None
}

/// Keep the candidates that pass every hard exclusion, in catalog order.
pub fn filter_candidates<'a>(
    candidates: &'a [ProductCandidate],
    ctx: &FilterContext,
) -> Vec<&'a ProductCandidate> {
    candidates
        .iter()
        .filter(|c| exclusion_reason(c, ctx).is_none())
        .collect()
}

use super::{strings, CategoryQualityRule, FoodCategory, NutritionTargets};

fn category(
    category: FoodCategory,
    avoid: &[&str],
    prefer: &[&str],
    targets: NutritionTargets,
) -> CategoryQualityRule {
    CategoryQualityRule {
        category,
        avoid_keywords: strings(avoid),
        prefer_keywords: strings(prefer),
        nutrition_targets: Some(targets),
    }
}

pub(super) fn builtin_category_rules() -> Vec<CategoryQualityRule> {
    vec![
        category(
            FoodCategory::Protein,
            &[
                "breaded",
                "battered",
                "nugget",
                "imitation",
                "meatless",
                "plant-based",
                "corn dog",
                "hot dog",
                "jerky",
            ],
            &[
                "lean",
                "grass fed",
                "grass-fed",
                "pasture raised",
                "no antibiotics",
                "all natural",
                "wild caught",
                "air chilled",
            ],
            NutritionTargets {
                max_sodium_mg: Some(450.0),
                max_saturated_fat_g: Some(6.0),
                min_protein_g: Some(15.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::Dairy,
            &[
                "dessert",
                "pudding",
                "ice cream",
                "frosting",
                "creamer",
                "cheese sauce",
                "cheese product",
                "processed cheese",
            ],
            &["whole milk", "plain", "unsweetened", "grass fed", "block", "natural"],
            NutritionTargets {
                max_sugar_g: Some(12.0),
                max_saturated_fat_g: Some(8.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::Carb,
            &["cake", "cookie", "donut", "frosted", "candy", "pastry", "snack"],
            &["whole grain", "whole wheat", "100% whole", "brown", "enriched"],
            NutritionTargets {
                max_sugar_g: Some(6.0),
                min_fiber_g: Some(2.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::Produce,
            &[
                "chips",
                "dip",
                "dressing",
                "juice",
                "soup",
                "pouch",
                "seasoning",
                "powder",
                "dried",
                "dehydrated",
            ],
            &["fresh", "whole", "organic", "bunch", "loose", "each"],
            NutritionTargets {
                max_sodium_mg: Some(50.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::FatsOils,
            &["spray", "flavored", "blend", "spread", "margarine", "shortening"],
            &["extra virgin", "cold pressed", "cold-pressed", "pure", "unrefined"],
            NutritionTargets {
                max_saturated_fat_g: Some(14.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::Snacks,
            &["candy", "frosted", "chocolate coated", "cheese flavored"],
            &["unsalted", "lightly salted", "raw", "roasted", "no sugar added"],
            NutritionTargets {
                max_sodium_mg: Some(200.0),
                max_sugar_g: Some(8.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::Beans,
            &["baked beans", "with pork", "chili beans", "refried", "in sauce"],
            &["dry", "dried", "low sodium", "no salt added", "organic"],
            NutritionTargets {
                max_sodium_mg: Some(400.0),
                min_fiber_g: Some(5.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::Fruits,
            &[
                "candy",
                "gummies",
                "fruit snacks",
                "pie filling",
                "syrup",
                "cocktail",
                "flavored",
                "pastry",
            ],
            &["fresh", "whole", "organic", "ripe", "each", "bag"],
            NutritionTargets {
                max_sugar_g: Some(20.0),
                min_fiber_g: Some(2.0),
                ..Default::default()
            },
        ),
        category(
            FoodCategory::Eggs,
            &["substitute", "egg whites only", "liquid egg", "hard boiled", "deviled"],
            &["large", "grade a", "cage free", "free range", "pasture raised", "brown"],
            NutritionTargets {
                min_protein_g: Some(6.0),
                ..Default::default()
            },
        ),
    ]
}

use super::FoodCategory::*;
use super::{rule, IngredientQualityRule, NutritionTargets};

pub(super) fn builtin_ingredient_rules() -> Vec<IngredientQualityRule> {
    vec![
        // ---- Protein ----
        rule(
            "chicken_breast",
            "chicken breast",
            Protein,
            &["chicken breast", "chicken breasts"],
            &["breaded", "nugget", "tender", "fried", "patty", "canned", "rotisserie", "strips"],
            &["boneless", "skinless", "fresh", "all natural", "air chilled"],
        )
        .with_targets(NutritionTargets {
            max_sodium_mg: Some(120.0),
            min_protein_g: Some(20.0),
            ..Default::default()
        }),
        rule(
            "chicken_thigh",
            "chicken thighs",
            Protein,
            &["chicken thigh", "chicken thighs"],
            &["breaded", "fried", "marinated", "canned"],
            &["boneless", "skinless", "bone-in", "fresh"],
        ),
        rule(
            "chicken_whole",
            "whole chicken",
            Protein,
            &["whole chicken", "roasting chicken", "fryer chicken"],
            &["rotisserie", "cooked", "seasoned"],
            &["whole", "fresh", "air chilled"],
        ),
        rule(
            "chicken",
            "chicken",
            Protein,
            &["chicken"],
            &["breaded", "nugget", "fried", "broth", "soup", "canned", "flavored"],
            &["fresh", "boneless", "skinless"],
        ),
        rule(
            "ground_beef",
            "ground beef",
            Protein,
            &["ground beef", "hamburger meat", "minced beef"],
            &["patties", "meatball", "seasoned", "cooked", "crumbles"],
            &["lean", "90%", "93%", "grass fed", "chuck"],
        )
        .with_targets(NutritionTargets {
            max_saturated_fat_g: Some(7.0),
            min_protein_g: Some(18.0),
            ..Default::default()
        }),
        rule(
            "beef_steak",
            "beef steak",
            Protein,
            &["steak", "sirloin", "ribeye", "flank steak", "skirt steak"],
            &["philly", "sandwich", "frozen", "seasoned", "sauce"],
            &["choice", "prime", "grass fed", "boneless"],
        ),
        rule(
            "beef_stew",
            "beef stew meat",
            Protein,
            &["stew meat", "beef chuck", "chuck roast"],
            &["canned", "stew kit", "seasoned"],
            &["boneless", "choice", "chuck"],
        ),
        rule(
            "ground_turkey",
            "ground turkey",
            Protein,
            &["ground turkey"],
            &["patties", "meatball", "seasoned", "sausage"],
            &["lean", "93%", "99%", "fresh"],
        ),
        rule(
            "turkey_breast",
            "turkey breast",
            Protein,
            &["turkey breast"],
            &["deli", "sliced", "smoked", "lunch meat"],
            &["boneless", "skinless", "fresh"],
        ),
        rule(
            "pork_chop",
            "pork chops",
            Protein,
            &["pork chop", "pork chops", "pork loin", "pork tenderloin"],
            &["breaded", "marinated", "seasoned", "smoked"],
            &["boneless", "center cut", "fresh"],
        ),
        rule(
            "bacon",
            "bacon",
            Protein,
            &["bacon"],
            &["bits", "bacon flavored", "imitation", "precooked"],
            &["thick cut", "uncured", "no sugar added", "center cut"],
        ),
        rule(
            "sausage",
            "sausage",
            Protein,
            &["sausage", "italian sausage", "chorizo"],
            &["gravy", "pizza", "biscuit", "sandwich"],
            &["uncured", "all natural", "links"],
        ),
        rule(
            "salmon",
            "salmon",
            Protein,
            &["salmon"],
            &["smoked", "canned", "cake", "burger", "jerky", "breaded"],
            &["wild caught", "fillet", "fresh", "skin-on", "atlantic", "sockeye"],
        ),
        rule(
            "shrimp",
            "shrimp",
            Protein,
            &["shrimp", "prawns"],
            &["breaded", "tempura", "popcorn", "coconut", "cocktail sauce", "scampi"],
            &["raw", "peeled", "deveined", "wild caught", "tail-on"],
        ),
        rule(
            "white_fish",
            "white fish fillets",
            Protein,
            &["cod", "tilapia", "halibut", "white fish", "mahi mahi"],
            &["breaded", "battered", "sticks", "fried", "sandwich"],
            &["fillet", "wild caught", "fresh", "skinless"],
        ),
        rule(
            "tuna_canned",
            "canned tuna",
            Protein,
            &["canned tuna", "tuna in water", "tuna"],
            &["salad kit", "creations", "flavored", "in oil"],
            &["in water", "chunk light", "solid white", "albacore"],
        ),
        rule(
            "tofu",
            "tofu",
            Protein,
            &["tofu"],
            &["dessert", "flavored", "seasoned"],
            &["extra firm", "firm", "organic"],
        ),
        // ---- Eggs ----
        rule(
            "eggs",
            "eggs",
            Eggs,
            &["egg", "eggs"],
            &["noodle", "roll", "substitute", "nog", "salad", "bites"],
            &["large", "grade a", "dozen", "cage free"],
        ),
        // ---- Dairy ----
        rule(
            "milk",
            "milk",
            Dairy,
            &["milk", "whole milk", "2% milk", "skim milk"],
            &["chocolate", "strawberry", "shake", "powdered", "condensed", "evaporated"],
            &["gallon", "vitamin d", "whole", "2%", "reduced fat"],
        ),
        rule(
            "butter",
            "butter",
            Dairy,
            &["butter", "unsalted butter", "salted butter"],
            &["peanut butter", "almond butter", "apple butter", "cookie", "spread", "popcorn"],
            &["unsalted", "sweet cream", "sticks", "grass fed"],
        ),
        rule(
            "cheddar",
            "cheddar cheese",
            Dairy,
            &["cheddar", "cheddar cheese"],
            &["cheese sauce", "crackers", "flavored", "cheese product", "popcorn"],
            &["sharp", "block", "shredded", "natural"],
        ),
        rule(
            "mozzarella",
            "mozzarella cheese",
            Dairy,
            &["mozzarella"],
            &["sticks", "breaded", "pizza"],
            &["whole milk", "fresh", "shredded", "low moisture"],
        ),
        rule(
            "parmesan",
            "parmesan cheese",
            Dairy,
            &["parmesan", "parmigiano"],
            &["crisps", "dressing", "alfredo"],
            &["grated", "shredded", "wedge", "aged"],
        ),
        rule(
            "cheese",
            "cheese",
            Dairy,
            &["cheese"],
            &["cheese product", "cheese sauce", "crackers", "puffs", "dip"],
            &["natural", "block", "shredded"],
        ),
        rule(
            "greek_yogurt",
            "greek yogurt",
            Dairy,
            &["greek yogurt"],
            &["fruit on the bottom", "dessert", "bar", "frozen", "dipped"],
            &["plain", "nonfat", "whole milk", "unsweetened"],
        ),
        rule(
            "yogurt",
            "yogurt",
            Dairy,
            &["yogurt", "yoghurt"],
            &["covered", "raisins", "pretzels", "melts", "frozen", "drink"],
            &["plain", "unsweetened", "whole milk"],
        ),
        rule(
            "heavy_cream",
            "heavy cream",
            Dairy,
            &["heavy cream", "heavy whipping cream", "whipping cream"],
            &["whipped topping", "aerosol", "creamer"],
            &["heavy", "pint", "ultra pasteurized"],
        ),
        rule(
            "sour_cream",
            "sour cream",
            Dairy,
            &["sour cream"],
            &["chips", "dip", "onion", "flavored"],
            &["regular", "cultured", "light"],
        ),
        rule(
            "cream_cheese",
            "cream cheese",
            Dairy,
            &["cream cheese"],
            &["frosting", "cheesecake", "strawberry", "honey"],
            &["original", "block", "brick"],
        ),
        // ---- Carbs ----
        rule(
            "rice",
            "rice",
            Carb,
            &["rice", "white rice", "jasmine rice", "basmati rice"],
            &["rice cakes", "cereal", "pudding", "seasoned", "flavored", "krispies", "vinegar"],
            &["long grain", "jasmine", "basmati", "enriched"],
        ),
        rule(
            "brown_rice",
            "brown rice",
            Carb,
            &["brown rice"],
            &["cakes", "seasoned", "flavored", "syrup"],
            &["whole grain", "long grain"],
        ),
        rule(
            "pasta",
            "pasta",
            Carb,
            &["pasta", "spaghetti", "penne", "fettuccine", "linguine", "macaroni", "rigatoni"],
            &["sauce", "salad", "mac & cheese", "dinner", "cheese", "canned"],
            &["whole wheat", "durum", "semolina", "enriched"],
        ),
        rule(
            "bread",
            "bread",
            Carb,
            &["bread", "sandwich bread", "loaf"],
            &["crumbs", "stuffing", "croutons", "pudding", "sweet"],
            &["whole wheat", "whole grain", "100% whole", "sliced"],
        ),
        rule(
            "tortillas",
            "tortillas",
            Carb,
            &["tortilla", "tortillas"],
            &["chips", "strips", "soup"],
            &["flour", "corn", "whole wheat"],
        ),
        rule(
            "oats",
            "rolled oats",
            Carb,
            &["oats", "oatmeal", "rolled oats"],
            &["cookie", "bar", "instant flavored", "maple brown sugar"],
            &["old fashioned", "rolled", "steel cut", "whole grain"],
        ),
        rule(
            "flour",
            "all-purpose flour",
            Pantry,
            &["flour", "all purpose flour", "all-purpose flour"],
            &["tortilla", "mix", "cake"],
            &["all purpose", "unbleached", "enriched"],
        ),
        rule(
            "quinoa",
            "quinoa",
            Carb,
            &["quinoa"],
            &["chips", "seasoned", "bowl"],
            &["organic", "white", "tri-color"],
        ),
        rule(
            "potatoes",
            "potatoes",
            Produce,
            &["potato", "potatoes", "russet", "yukon gold"],
            &["chips", "fries", "tots", "instant", "mashed", "hash brown", "salad", "sweet potato"],
            &["russet", "yukon", "bag", "loose"],
        ),
        rule(
            "sweet_potato",
            "sweet potatoes",
            Produce,
            &["sweet potato", "sweet potatoes", "yam", "yams"],
            &["fries", "chips", "canned", "casserole", "pie"],
            &["fresh", "loose", "each"],
        ),
        // ---- Produce (vegetables) ----
        rule(
            "onion",
            "onion",
            Produce,
            &["onion", "onions", "yellow onion", "white onion", "red onion", "sweet onion"],
            &["rings", "powder", "soup mix", "dip", "fried", "flakes", "salt"],
            &["yellow", "sweet", "each", "bag"],
        ),
        rule(
            "green_onion",
            "green onions",
            Produce,
            &["green onion", "green onions", "scallion", "scallions"],
            &["dip", "dried"],
            &["bunch", "fresh"],
        ),
        rule(
            "garlic",
            "garlic",
            Produce,
            &["garlic"],
            &["bread", "powder", "salt", "seasoning", "knots", "sauce"],
            &["whole", "bulb", "fresh", "peeled"],
        ),
        rule(
            "bell_pepper",
            "bell pepper",
            Produce,
            &["bell pepper", "bell peppers", "red pepper", "green pepper"],
            &["roasted", "jar", "flakes", "stuffed", "sauce"],
            &["each", "fresh", "red", "green"],
        ),
        rule(
            "jalapeno",
            "jalapeño",
            Produce,
            &["jalapeno", "jalapeño", "jalapenos"],
            &["sliced jar", "pickled", "chips", "poppers", "cheese"],
            &["fresh", "each"],
        ),
        rule(
            "tomato",
            "tomatoes",
            Produce,
            &["tomato", "tomatoes", "roma tomato", "cherry tomatoes"],
            &["sauce", "paste", "ketchup", "soup", "juice", "dried", "canned", "diced tomatoes"],
            &["roma", "vine", "fresh", "cherry"],
        ),
        rule(
            "canned_tomatoes",
            "canned tomatoes",
            Pantry,
            &["canned tomatoes", "diced tomatoes", "crushed tomatoes", "tomato sauce", "tomato paste"],
            &["soup", "ketchup", "salsa"],
            &["no salt added", "organic", "san marzano"],
        )
        .with_note("Shelf-stable: never satisfied by fresh tomatoes."),
        rule(
            "carrots",
            "carrots",
            Produce,
            &["carrot", "carrots"],
            &["cake", "juice", "chips", "glazed"],
            &["whole", "baby", "bag", "fresh"],
        ),
        rule(
            "celery",
            "celery",
            Produce,
            &["celery"],
            &["salt", "seed", "soup", "juice"],
            &["stalks", "hearts", "fresh"],
        ),
        rule(
            "broccoli",
            "broccoli",
            Produce,
            &["broccoli"],
            &["cheese", "casserole", "salad kit", "soup", "rice"],
            &["crowns", "florets", "fresh"],
        ),
        rule(
            "spinach",
            "spinach",
            Produce,
            &["spinach", "baby spinach"],
            &["dip", "artichoke", "creamed", "pasta", "wraps"],
            &["baby", "fresh", "bag", "organic"],
        ),
        rule(
            "lettuce",
            "lettuce",
            Produce,
            &["lettuce", "romaine", "iceberg", "salad greens", "mixed greens"],
            &["salad kit", "dressing", "croutons"],
            &["hearts", "head", "fresh"],
        ),
        rule(
            "cucumber",
            "cucumber",
            Produce,
            &["cucumber", "cucumbers"],
            &["pickle", "pickles", "relish", "water", "lotion"],
            &["fresh", "each", "english"],
        ),
        rule(
            "zucchini",
            "zucchini",
            Produce,
            &["zucchini", "squash"],
            &["bread", "chips", "noodles", "fries"],
            &["fresh", "each", "green"],
        ),
        rule(
            "mushrooms",
            "mushrooms",
            Produce,
            &["mushroom", "mushrooms"],
            &["soup", "canned", "jar", "sauce", "gravy"],
            &["white", "baby bella", "cremini", "sliced", "fresh"],
        ),
        rule(
            "corn",
            "corn",
            Produce,
            &["corn", "sweet corn", "corn on the cob"],
            &["chips", "tortilla", "starch", "syrup", "meal", "dog", "flakes", "muffin"],
            &["fresh", "ears", "sweet"],
        ),
        rule(
            "green_beans",
            "green beans",
            Produce,
            &["green bean", "green beans", "string beans"],
            &["casserole", "fried", "chips"],
            &["fresh", "trimmed", "bag"],
        ),
        rule(
            "cauliflower",
            "cauliflower",
            Produce,
            &["cauliflower"],
            &["pizza", "crust", "tots", "mac", "rice bowl"],
            &["head", "florets", "fresh"],
        ),
        rule(
            "cabbage",
            "cabbage",
            Produce,
            &["cabbage", "coleslaw mix"],
            &["dressing", "kimchi", "sauerkraut"],
            &["head", "green", "red", "fresh"],
        ),
        rule(
            "ginger",
            "ginger root",
            Produce,
            &["ginger", "ginger root", "fresh ginger"],
            &["ale", "ground", "snaps", "candied", "beer", "tea"],
            &["root", "fresh"],
        ),
        rule(
            "herbs_fresh",
            "fresh herbs",
            Produce,
            &["cilantro", "parsley", "fresh basil", "fresh thyme", "fresh rosemary", "dill"],
            &["dried", "flakes", "paste", "pickles", "seasoning"],
            &["bunch", "fresh", "organic"],
        ),
        rule(
            "avocado",
            "avocado",
            Produce,
            &["avocado", "avocados"],
            &["oil", "dip", "guacamole", "mayo", "chips"],
            &["hass", "each", "ripe", "fresh"],
        ),
        // ---- Fruits ----
        rule(
            "lemon",
            "lemons",
            Fruits,
            &["lemon", "lemons"],
            &["lemonade", "pie", "cake", "candy", "pepper", "tea", "soda", "cookies"],
            &["fresh", "each", "bag", "organic"],
        ),
        rule(
            "lemon_juice",
            "lemon juice",
            Condiments,
            &["lemon juice"],
            &["lemonade", "drink", "cocktail", "tea"],
            &["100%", "bottle", "not from concentrate"],
        )
        .with_note("Bottled juice is acceptable; whole lemons are not filtered out."),
        rule(
            "lime",
            "limes",
            Fruits,
            &["lime", "limes"],
            &["soda", "chips", "margarita", "pie", "candy", "juice"],
            &["fresh", "each", "bag"],
        ),
        rule(
            "lime_juice",
            "lime juice",
            Condiments,
            &["lime juice"],
            &["margarita", "drink", "cocktail"],
            &["100%", "bottle"],
        ),
        rule(
            "apples",
            "apples",
            Fruits,
            &["apple", "apples", "gala", "granny smith", "honeycrisp", "fuji"],
            &["juice", "sauce", "applesauce", "pie", "chips", "cider", "butter", "vinegar"],
            &["fresh", "each", "bag"],
        ),
        rule(
            "bananas",
            "bananas",
            Fruits,
            &["banana", "bananas"],
            &["chips", "bread", "pudding", "cream pie", "flavored", "peppers"],
            &["fresh", "bunch", "each"],
        ),
        rule(
            "berries",
            "berries",
            Fruits,
            &["strawberries", "blueberries", "raspberries", "blackberries", "berries"],
            &["jam", "jelly", "preserves", "yogurt", "cereal", "syrup", "pie filling", "dried"],
            &["fresh", "organic", "pint", "container"],
        ),
        rule(
            "oranges",
            "oranges",
            Fruits,
            &["orange", "oranges", "navel", "clementine", "mandarin"],
            &["juice", "soda", "chicken", "marmalade", "candy"],
            &["fresh", "navel", "bag", "each"],
        ),
        rule(
            "grapes",
            "grapes",
            Fruits,
            &["grape", "grapes"],
            &["juice", "jelly", "tomatoes", "soda", "raisins"],
            &["seedless", "red", "green", "fresh"],
        ),
        // ---- Beans & legumes ----
        rule(
            "black_beans",
            "black beans",
            Beans,
            &["black beans", "black bean"],
            &["soup", "chips", "burger", "dip", "seasoned"],
            &["low sodium", "no salt added", "organic", "dry"],
        ),
        rule(
            "chickpeas",
            "chickpeas",
            Beans,
            &["chickpeas", "chickpea", "garbanzo", "garbanzo beans"],
            &["hummus", "pasta", "snack", "roasted", "puffs"],
            &["low sodium", "organic", "dry"],
        ),
        rule(
            "kidney_beans",
            "kidney beans",
            Beans,
            &["kidney beans", "pinto beans", "cannellini", "white beans"],
            &["chili", "refried", "baked", "soup"],
            &["low sodium", "no salt added", "dry"],
        ),
        rule(
            "lentils",
            "lentils",
            Beans,
            &["lentil", "lentils"],
            &["soup", "chips", "pasta"],
            &["dry", "dried", "green", "red", "brown"],
        ),
        // ---- Fats & oils ----
        rule(
            "olive_oil",
            "olive oil",
            FatsOils,
            &["olive oil", "extra virgin olive oil", "evoo"],
            &["spray", "cooking spray", "blend", "infused", "tuna", "sardines"],
            &["extra virgin", "cold pressed", "100%"],
        ),
        rule(
            "vegetable_oil",
            "vegetable oil",
            FatsOils,
            &["vegetable oil", "canola oil", "cooking oil", "avocado oil", "sesame oil"],
            &["spray", "shortening"],
            &["pure", "100%"],
        ),
        rule(
            "peanut_butter",
            "peanut butter",
            Snacks,
            &["peanut butter"],
            &["cups", "cookies", "crackers", "candy", "filled", "pretzels"],
            &["natural", "creamy", "crunchy", "no sugar added"],
        ),
        rule(
            "nuts",
            "nuts",
            Snacks,
            &["almonds", "walnuts", "pecans", "cashews", "peanuts", "pistachios"],
            &["candy", "chocolate", "honey roasted", "butter", "milk", "flour"],
            &["raw", "unsalted", "halves", "whole"],
        ),
        // ---- Pantry, condiments & spices ----
        rule(
            "chicken_broth",
            "chicken broth",
            Pantry,
            &["chicken broth", "chicken stock"],
            &["soup", "noodle", "bouillon"],
            &["low sodium", "reduced sodium", "organic", "carton"],
        ),
        rule(
            "vegetable_broth",
            "vegetable broth",
            Pantry,
            &["vegetable broth", "vegetable stock"],
            &["soup", "bouillon"],
            &["low sodium", "organic", "carton"],
        ),
        rule(
            "sugar",
            "granulated sugar",
            Pantry,
            &["sugar", "granulated sugar", "brown sugar", "powdered sugar"],
            &["free", "substitute", "cookies", "cereal", "snap peas"],
            &["pure cane", "granulated", "bag"],
        ),
        rule(
            "honey",
            "honey",
            Pantry,
            &["honey"],
            &["nut", "roasted", "mustard", "graham", "bbq", "ham"],
            &["pure", "raw", "local", "clover"],
        ),
        rule(
            "soy_sauce",
            "soy sauce",
            Condiments,
            &["soy sauce", "tamari"],
            &["packets", "marinade"],
            &["low sodium", "reduced sodium", "naturally brewed"],
        ),
        rule(
            "vinegar",
            "vinegar",
            Condiments,
            &["vinegar", "balsamic", "apple cider vinegar"],
            &["chips", "dressing", "cleaning"],
            &["distilled", "raw", "unfiltered"],
        ),
        rule(
            "salt",
            "salt",
            Spices,
            &["salt", "kosher salt", "sea salt"],
            &["garlic salt", "celery salt", "seasoned", "water softener", "salted caramel"],
            &["kosher", "sea", "iodized", "fine"],
        ),
        rule(
            "black_pepper",
            "black pepper",
            Spices,
            &["black pepper", "ground pepper", "peppercorns"],
            &["jerky", "chips", "turkey"],
            &["ground", "whole", "cracked"],
        ),
        rule(
            "garlic_powder",
            "garlic powder",
            Spices,
            &["garlic powder", "granulated garlic", "garlic salt"],
            &["bread", "butter", "sauce"],
            &["powder", "granulated", "pure"],
        )
        .with_note("Never satisfied by fresh garlic bulbs."),
        rule(
            "onion_powder",
            "onion powder",
            Spices,
            &["onion powder", "dried minced onion", "onion flakes"],
            &["soup mix", "dip"],
            &["powder", "pure"],
        ),
        rule(
            "ground_spices",
            "ground spices",
            Spices,
            &[
                "cumin",
                "paprika",
                "chili powder",
                "cinnamon",
                "oregano",
                "ground ginger",
                "ground cloves",
                "nutmeg",
                "turmeric",
                "italian seasoning",
                "red pepper flakes",
                "dried basil",
                "dried thyme",
            ],
            &["candy", "gum", "rolls", "toast crunch", "roll", "cereal", "tea"],
            &["ground", "pure", "organic"],
        ),
        rule(
            "vanilla",
            "vanilla extract",
            Pantry,
            &["vanilla extract", "vanilla"],
            &["ice cream", "yogurt", "wafers", "creamer", "protein", "milk"],
            &["pure", "extract"],
        ),
        rule(
            "baking_powder",
            "baking powder",
            Pantry,
            &["baking powder", "baking soda"],
            &["toothpaste", "deodorant", "detergent"],
            &["double acting", "aluminum free", "pure"],
        ),
        // ---- Beverages ----
        rule(
            "orange_juice",
            "orange juice",
            Beverages,
            &["orange juice"],
            &["drink", "cocktail", "soda", "flavored"],
            &["100%", "not from concentrate", "no pulp"],
        ),
        rule(
            "coffee",
            "coffee",
            Beverages,
            &["coffee", "ground coffee", "coffee beans"],
            &["creamer", "ice cream", "candy", "liqueur"],
            &["whole bean", "ground", "medium roast"],
        ),
    ]
}

//! Recipe search over a small built-in catalog.
//!
//! Queries are free text ("nut-free cookies"). Dietary qualifiers in the
//! query exclude recipes carrying the matching allergen tags; the remaining
//! words are matched against recipe names and keywords.

use async_trait::async_trait;
use hearth_core::error::ToolError;
use hearth_core::outcome::ToolOutcome;
use hearth_core::tool::{RunContext, Tool};
use serde::Serialize;
use tracing::debug;

const MAX_RESULTS: usize = 5;

pub struct FindRecipeTool;

#[async_trait]
impl Tool for FindRecipeTool {
    fn name(&self) -> &str {
        "find_recipe"
    }

    fn description(&self) -> &str {
        "Search recipes by keyword. Input: a short query such as \"cookies\". \
         Dietary qualifiers (nut-free, peanut-free, vegan, gluten-free) exclude unsuitable recipes."
    }

    async fn invoke(&self, input: &str, _context: &RunContext) -> Result<ToolOutcome, ToolError> {
        let query = input.trim().trim_matches('"').trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("Empty recipe query".into()));
        }

        let recipes = search(query);
        debug!(query = %query, matches = recipes.len(), "Recipe search");

        let outcome = if recipes.is_empty() {
            ToolOutcome::success(format!("No recipes found for '{query}'"))
        } else {
            let names: Vec<&str> = recipes.iter().map(|r| r.name).collect();
            ToolOutcome::success(format!(
                "Found {} recipe(s) for '{}': {}",
                recipes.len(),
                query,
                names.join(", ")
            ))
        };

        let recipes = serde_json::to_value(&recipes)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        Ok(outcome.with_field("recipes", recipes).into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Allergen {
    Peanut,
    TreeNut,
    Gluten,
    Dairy,
    Egg,
}

#[derive(Debug, Serialize)]
struct Recipe {
    name: &'static str,
    minutes: u32,
    ingredients: &'static [&'static str],
    contains: &'static [Allergen],
    #[serde(skip)]
    keywords: &'static [&'static str],
}

static CATALOG: &[Recipe] = &[
    Recipe {
        name: "Peanut Butter Cookies",
        minutes: 25,
        ingredients: &["peanut butter", "sugar", "egg", "flour"],
        contains: &[Allergen::Peanut, Allergen::Gluten, Allergen::Egg],
        keywords: &["cookie", "dessert", "baking", "snack"],
    },
    Recipe {
        name: "Chocolate Chip Cookies",
        minutes: 30,
        ingredients: &["flour", "butter", "brown sugar", "egg", "chocolate chips"],
        contains: &[Allergen::Gluten, Allergen::Dairy, Allergen::Egg],
        keywords: &["cookie", "dessert", "baking", "chocolate"],
    },
    Recipe {
        name: "Oatmeal Raisin Cookies",
        minutes: 35,
        ingredients: &["rolled oats", "flour", "butter", "raisins", "cinnamon", "egg"],
        contains: &[Allergen::Gluten, Allergen::Dairy, Allergen::Egg],
        keywords: &["cookie", "dessert", "baking", "oat"],
    },
    Recipe {
        name: "Almond Shortbread",
        minutes: 40,
        ingredients: &["almond flour", "butter", "powdered sugar", "vanilla"],
        contains: &[Allergen::TreeNut, Allergen::Dairy],
        keywords: &["cookie", "dessert", "baking", "shortbread"],
    },
    Recipe {
        name: "Vegan Banana Oat Cookies",
        minutes: 20,
        ingredients: &["rolled oats", "banana", "maple syrup", "dark chocolate"],
        contains: &[],
        keywords: &["cookie", "dessert", "snack", "oat", "banana"],
    },
    Recipe {
        name: "Banana Walnut Bread",
        minutes: 70,
        ingredients: &["flour", "banana", "egg", "butter", "walnuts"],
        contains: &[Allergen::Gluten, Allergen::Egg, Allergen::Dairy, Allergen::TreeNut],
        keywords: &["bread", "breakfast", "baking", "banana"],
    },
    Recipe {
        name: "Buttermilk Pancakes",
        minutes: 20,
        ingredients: &["flour", "buttermilk", "egg", "butter", "baking powder"],
        contains: &[Allergen::Gluten, Allergen::Dairy, Allergen::Egg],
        keywords: &["pancake", "breakfast", "brunch"],
    },
    Recipe {
        name: "Vegetable Stir Fry",
        minutes: 25,
        ingredients: &["broccoli", "bell pepper", "carrot", "soy sauce", "rice"],
        contains: &[Allergen::Gluten],
        keywords: &["dinner", "stir", "fry", "vegetable", "rice"],
    },
    Recipe {
        name: "Red Lentil Soup",
        minutes: 45,
        ingredients: &["red lentils", "carrot", "onion", "cumin", "vegetable stock"],
        contains: &[],
        keywords: &["soup", "dinner", "lunch", "lentil", "vegetable"],
    },
];

/// Qualifier words and the allergens they exclude.
const QUALIFIERS: &[(&str, &[Allergen])] = &[
    ("nut-free", &[Allergen::Peanut, Allergen::TreeNut]),
    ("peanut-free", &[Allergen::Peanut]),
    ("gluten-free", &[Allergen::Gluten]),
    ("dairy-free", &[Allergen::Dairy]),
    ("vegan", &[Allergen::Dairy, Allergen::Egg]),
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "the", "for", "with", "some", "recipe", "recipes", "me", "find", "of",
];

fn search(query: &str) -> Vec<&'static Recipe> {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();

    let excluded: Vec<Allergen> = QUALIFIERS
        .iter()
        .filter(|(qualifier, _)| words.contains(qualifier))
        .flat_map(|(_, allergens)| allergens.iter().copied())
        .collect();

    let terms: Vec<String> = words
        .iter()
        .filter(|w| !STOPWORDS.contains(*w) && !QUALIFIERS.iter().any(|(q, _)| q == *w))
        .map(|w| singular(w))
        .collect();

    CATALOG
        .iter()
        .filter(|recipe| !recipe.contains.iter().any(|a| excluded.contains(a)))
        .filter(|recipe| terms.is_empty() || terms.iter().any(|t| matches_term(recipe, t)))
        .take(MAX_RESULTS)
        .collect()
}

fn matches_term(recipe: &Recipe, term: &str) -> bool {
    let name = recipe.name.to_lowercase();
    name.split_whitespace().any(|w| singular(w) == term)
        || recipe.keywords.iter().any(|k| *k == term)
        || recipe.ingredients.iter().any(|i| i.contains(term))
}

fn singular(word: &str) -> String {
    word.strip_suffix('s')
        .filter(|stem| stem.len() > 2)
        .unwrap_or(word)
        .to_string()
}

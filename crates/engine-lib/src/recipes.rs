//! Recipe suggestions for items close to expiry

use crate::models::RecipeSuggestion;

/// Maximum suggestions returned per request
pub const MAX_SUGGESTIONS: usize = 5;

struct RecipeTemplate {
    keyword: &'static str,
    recipe_id: &'static str,
    name: &'static str,
    description: &'static str,
    extra_ingredients: &'static [&'static str],
    cooking_time_minutes: u32,
    servings: u32,
    priority_score: f64,
}

// Checked in order; an item matches at most one template.
const TEMPLATES: &[RecipeTemplate] = &[
    RecipeTemplate {
        keyword: "apple",
        recipe_id: "apple-crumble-001",
        name: "Apple Crumble",
        description: "Classic apple crumble using fresh apples",
        extra_ingredients: &["flour", "butter", "sugar", "cinnamon"],
        cooking_time_minutes: 45,
        servings: 6,
        priority_score: 0.9,
    },
    RecipeTemplate {
        keyword: "banana",
        recipe_id: "banana-bread-001",
        name: "Banana Bread",
        description: "Moist banana bread perfect for overripe bananas",
        extra_ingredients: &["flour", "eggs", "sugar", "butter"],
        cooking_time_minutes: 60,
        servings: 8,
        priority_score: 0.95,
    },
    RecipeTemplate {
        keyword: "tomato",
        recipe_id: "tomato-soup-001",
        name: "Fresh Tomato Soup",
        description: "Creamy tomato soup using fresh tomatoes",
        extra_ingredients: &["onion", "garlic", "cream", "basil"],
        cooking_time_minutes: 30,
        servings: 4,
        priority_score: 0.85,
    },
];

impl RecipeTemplate {
    fn suggest_for(&self, item: &str) -> RecipeSuggestion {
        let mut ingredients = Vec::with_capacity(self.extra_ingredients.len() + 1);
        ingredients.push(item.to_string());
        ingredients.extend(self.extra_ingredients.iter().map(|s| s.to_string()));

        RecipeSuggestion {
            recipe_id: self.recipe_id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            ingredients,
            cooking_time_minutes: self.cooking_time_minutes,
            difficulty: "easy".to_string(),
            servings: self.servings,
            priority_score: self.priority_score,
            uses_expiring_items: vec![item.to_string()],
        }
    }
}

/// Keyword-table recipe suggester
#[derive(Debug, Clone, Default)]
pub struct RecipeSuggester {
    _private: (),
}

impl RecipeSuggester {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Suggestions for the expiring items, highest priority first.
    ///
    /// Dietary preferences are accepted for forward compatibility but do not
    /// filter the fixed table.
    pub fn suggest(&self, expiring_items: &[String], _dietary_preferences: &[String]) -> Vec<RecipeSuggestion> {
        let mut suggestions: Vec<RecipeSuggestion> = expiring_items
            .iter()
            .filter_map(|item| {
                let lowered = item.to_lowercase();
                TEMPLATES
                    .iter()
                    .find(|t| lowered.contains(t.keyword))
                    .map(|t| t.suggest_for(item))
            })
            .collect();

        suggestions.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

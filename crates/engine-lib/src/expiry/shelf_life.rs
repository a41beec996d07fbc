//! Shelf-life lookup tables

use crate::models::{FoodCategory, PackagingType, StorageMethod};

/// Shelf life used for categories without a dedicated entry
pub const DEFAULT_SHELF_LIFE_DAYS: u32 = 7;

/// Lower bound of the usage dampening factor
pub const MIN_USAGE_FACTOR: f64 = 0.5;

/// Typical shelf life in days when stored in a fridge with plain packaging
pub fn base_shelf_life_days(category: FoodCategory) -> u32 {
    match category {
        FoodCategory::Fruits => 7,
        FoodCategory::Vegetables => 10,
        FoodCategory::Dairy => 14,
        FoodCategory::Meat => 5,
        FoodCategory::Seafood => 3,
        FoodCategory::Bakery => 3,
        FoodCategory::Grains => 365,
        FoodCategory::Beverages => 365,
        FoodCategory::Snacks => 30,
        FoodCategory::Other => DEFAULT_SHELF_LIFE_DAYS,
    }
}

pub fn storage_multiplier(storage: StorageMethod) -> f64 {
    match storage {
        StorageMethod::Fridge => 1.0,
        StorageMethod::Freezer => 3.0,
        StorageMethod::Pantry => 0.8,
        StorageMethod::Counter => 0.6,
        StorageMethod::Outside => 0.4,
    }
}

pub fn packaging_multiplier(packaging: PackagingType) -> f64 {
    match packaging {
        PackagingType::Vacuum => 1.5,
        PackagingType::Glass => 1.2,
        PackagingType::Metal => 1.1,
        PackagingType::Plastic => 1.0,
        PackagingType::Paper => 0.8,
        PackagingType::Clamshell => 0.9,
        PackagingType::Unpackaged => 0.7,
    }
}

/// Heavier use shortens the effective shelf life, never below half
pub fn usage_factor(usage_rate_per_week: f64) -> f64 {
    (1.0 - usage_rate_per_week * 0.1).max(MIN_USAGE_FACTOR)
}

/// Categories whose shelf life is well characterised
pub fn is_well_known(category: FoodCategory) -> bool {
    matches!(
        category,
        FoodCategory::Fruits
            | FoodCategory::Vegetables
            | FoodCategory::Dairy
            | FoodCategory::Meat
            | FoodCategory::Seafood
            | FoodCategory::Bakery
    )
}

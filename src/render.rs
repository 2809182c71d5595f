//! Plain-text report for a scan result.

use std::fmt;

use crate::model::{Nutrients, Recipe, ScanResult};

/// Display adapter printing the full report: identification, nutrients,
/// recipes, advice, season.
pub struct Report<'a>(pub &'a ScanResult);

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "\n{}\n{}", title, "-".repeat(title.chars().count()))
}

fn bullets(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for item in items {
        writeln!(f, "  - {}", item)?;
    }
    Ok(())
}

fn write_nutrients(f: &mut fmt::Formatter<'_>, nutrients: &Nutrients) -> fmt::Result {
    heading(f, "Nutritional Values")?;
    writeln!(f, "  Calories: {}", nutrients.calories)?;
    writeln!(f, "  Protein:  {}", nutrients.protein)?;
    writeln!(f, "  Carbs:    {}", nutrients.carbs)?;
    writeln!(f, "  Fiber:    {}", nutrients.fiber)?;
    if !nutrients.vitamins.is_empty() {
        writeln!(f, "  Vitamins: {}", nutrients.vitamins.join(", "))?;
    }
    if !nutrients.minerals.is_empty() {
        writeln!(f, "  Minerals: {}", nutrients.minerals.join(", "))?;
    }
    Ok(())
}

fn write_recipe(f: &mut fmt::Formatter<'_>, index: usize, recipe: &Recipe) -> fmt::Result {
    writeln!(f, "\n{}. {}", index + 1, recipe.name)?;
    if !recipe.cultural_note.is_empty() {
        writeln!(f, "  {}", recipe.cultural_note)?;
    }
    writeln!(f, "  Ingredients:")?;
    bullets(f, &recipe.ingredients)?;
    writeln!(f, "  Steps:")?;
    for (n, step) in recipe.steps.iter().enumerate() {
        writeln!(f, "  {}. {}", n + 1, step)?;
    }
    writeln!(f, "  Healthy Meal Pairing:")?;
    bullets(f, &recipe.healthy_pairings)?;
    if !recipe.meal_balance_reason.is_empty() {
        writeln!(f, "  {}", recipe.meal_balance_reason)?;
    }
    Ok(())
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "{}", result.food_name)?;
        writeln!(f, "{}", result.description)?;

        write_nutrients(f, &result.nutrients)?;

        heading(f, "Zimbabwean Recipes")?;
        for (index, recipe) in result.recipes.iter().enumerate() {
            write_recipe(f, index, recipe)?;
        }

        heading(f, "Health Insights")?;
        writeln!(f, "{}", result.health_advice)?;

        heading(f, "Seasonal Availability")?;
        writeln!(f, "{}", result.seasonal_info)
    }
}

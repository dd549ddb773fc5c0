use serde::{Deserialize, Serialize};
use serde_json::Number;

/// One component of a drink's recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Stored drink; serialises as the detailed ("long") representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drink {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Public ("short") representation: ingredient names stay hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkSummary {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<IngredientSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientSummary {
    pub color: String,
    pub parts: u32,
}

impl Drink {
    pub fn short(&self) -> DrinkSummary {
        DrinkSummary {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| IngredientSummary {
                    color: ingredient.color.clone(),
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrinkChanges {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

impl DrinkChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.recipe.is_none()
    }
}

/// Clients send either a single ingredient or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<IngredientInput>),
    One(IngredientInput),
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Kept as a raw JSON number so fractional or negative values fail validation, not parsing.
    #[serde(default)]
    pub parts: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    Empty,
    MissingName(usize),
    MissingColor(usize),
    InvalidParts(usize),
}

impl RecipeError {
    pub fn message(&self) -> String {
        match self {
            RecipeError::Empty => "recipe must contain at least one ingredient".to_string(),
            RecipeError::MissingName(idx) => format!("ingredient {idx} is missing a name"),
            RecipeError::MissingColor(idx) => format!("ingredient {idx} is missing a color"),
            RecipeError::InvalidParts(idx) => {
                format!("ingredient {idx} must have a positive number of parts")
            }
        }
    }
}

impl RecipeInput {
    pub fn into_ingredients(self) -> Result<Vec<Ingredient>, RecipeError> {
        let items = match self {
            RecipeInput::Many(items) => items,
            RecipeInput::One(item) => vec![item],
        };
        if items.is_empty() {
            return Err(RecipeError::Empty);
        }

        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let name = non_blank(item.name).ok_or(RecipeError::MissingName(idx))?;
                let color = non_blank(item.color).ok_or(RecipeError::MissingColor(idx))?;
                let parts = item
                    .parts
                    .as_ref()
                    .and_then(Number::as_u64)
                    .filter(|parts| *parts > 0)
                    .and_then(|parts| u32::try_from(parts).ok())
                    .ok_or(RecipeError::InvalidParts(idx))?;
                Ok(Ingredient { name, color, parts })
            })
            .collect()
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    Json,
};
use common_auth::Authorized;
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app_state::AppState;
use crate::model::{non_blank, Drink, DrinkChanges, DrinkSummary, Ingredient, NewDrink, RecipeError, RecipeInput};
use crate::permissions::{DeleteDrinks, GetDrinksDetail, PatchDrinks, PostDrinks};

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    fn ok(drinks: Vec<T>) -> Json<Self> {
        Json(Self { success: true, drinks })
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i32,
}

#[derive(Debug, Deserialize)]
pub struct NewDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest {
            code: "invalid_body",
            message: Some(rejection.body_text()),
        })
}

fn drink_id(path: Result<Path<i32>, PathRejection>) -> ApiResult<i32> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::not_found("drink_not_found"))
}

fn parse_recipe(input: RecipeInput) -> ApiResult<Vec<Ingredient>> {
    input.into_ingredients().map_err(|err| match err {
        RecipeError::Empty => ApiError::BadRequest {
            code: "missing_recipe",
            message: Some(err.message()),
        },
        _ => ApiError::unprocessable("invalid_recipe", err.message()),
    })
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_drinks(State(state): State<AppState>) -> ApiResult<Json<DrinksResponse<DrinkSummary>>> {
    let drinks = state.store.list().await?;
    Ok(DrinksResponse::ok(drinks.iter().map(Drink::short).collect()))
}

pub async fn get_drinks_detail(
    State(state): State<AppState>,
    _auth: Authorized<GetDrinksDetail>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let drinks = state.store.list().await?;
    Ok(DrinksResponse::ok(drinks))
}

pub async fn create_drink(
    State(state): State<AppState>,
    auth: Authorized<PostDrinks>,
    payload: Result<Json<NewDrinkRequest>, JsonRejection>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let request = body(payload)?;
    let title = non_blank(request.title).ok_or(ApiError::BadRequest {
        code: "missing_title",
        message: Some("title is required".into()),
    })?;
    let recipe_input = request.recipe.ok_or(ApiError::BadRequest {
        code: "missing_recipe",
        message: Some("recipe is required".into()),
    })?;
    let recipe = parse_recipe(recipe_input)?;

    let drink = state.store.insert(NewDrink { title, recipe }).await?;
    info!(drink_id = drink.id, title = %drink.title, subject = ?auth.claims.subject, "Drink created");
    Ok(DrinksResponse::ok(vec![drink]))
}

pub async fn update_drink(
    State(state): State<AppState>,
    auth: Authorized<PatchDrinks>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let id = drink_id(path)?;
    let request = body(payload)?;
    let title = request
        .title
        .map(|title| {
            non_blank(Some(title)).ok_or(ApiError::BadRequest {
                code: "missing_title",
                message: Some("title must not be blank".into()),
            })
        })
        .transpose()?;
    let changes = DrinkChanges {
        title,
        recipe: request.recipe.map(parse_recipe).transpose()?,
    };

    let updated = if changes.is_empty() {
        state.store.get(id).await?
    } else {
        state.store.update(id, changes).await?
    };
    let drink = updated.ok_or(ApiError::not_found("drink_not_found"))?;

    info!(drink_id = drink.id, subject = ?auth.claims.subject, "Drink updated");
    Ok(DrinksResponse::ok(vec![drink]))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    auth: Authorized<DeleteDrinks>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = drink_id(path)?;
    if !state.store.delete(id).await? {
        return Err(ApiError::not_found("drink_not_found"));
    }

    info!(drink_id = id, subject = ?auth.claims.subject, "Drink deleted");
    Ok(Json(DeleteResponse { success: true, delete: id }))
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use common_http_errors::ApiError;
use sqlx::types::Json as SqlJson;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{Drink, DrinkChanges, Ingredient, NewDrink};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a drink titled '{0}' already exists")]
    DuplicateTitle(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateTitle(_) => ApiError::unprocessable("duplicate_title", value.to_string()),
            StoreError::Database(_) => ApiError::internal(value),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for drinks, kept behind a trait so handlers run against Postgres or memory.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Drink>>;
    async fn get(&self, id: i32) -> StoreResult<Option<Drink>>;
    async fn insert(&self, drink: NewDrink) -> StoreResult<Drink>;
    /// `None` when no drink has this id.
    async fn update(&self, id: i32, changes: DrinkChanges) -> StoreResult<Option<Drink>>;
    /// `false` when no drink has this id.
    async fn delete(&self, id: i32) -> StoreResult<bool>;
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    drinks: BTreeMap<i32, Drink>,
}

impl MemoryState {
    fn title_taken(&self, title: &str, except: Option<i32>) -> bool {
        self.drinks
            .values()
            .any(|drink| drink.title == title && Some(drink.id) != except)
    }
}

#[derive(Default)]
pub struct InMemoryDrinkStore {
    inner: RwLock<MemoryState>,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkStore for InMemoryDrinkStore {
    async fn list(&self) -> StoreResult<Vec<Drink>> {
        let state = self.inner.read().await;
        Ok(state.drinks.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Drink>> {
        let state = self.inner.read().await;
        Ok(state.drinks.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> StoreResult<Drink> {
        let mut state = self.inner.write().await;
        if state.title_taken(&drink.title, None) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }
        state.next_id += 1;
        let stored = Drink {
            id: state.next_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        state.drinks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i32, changes: DrinkChanges) -> StoreResult<Option<Drink>> {
        let mut state = self.inner.write().await;
        if !state.drinks.contains_key(&id) {
            return Ok(None);
        }
        if let Some(title) = &changes.title {
            if state.title_taken(title, Some(id)) {
                return Err(StoreError::DuplicateTitle(title.clone()));
            }
        }
        let Some(drink) = state.drinks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            drink.title = title;
        }
        if let Some(recipe) = changes.recipe {
            drink.recipe = recipe;
        }
        Ok(Some(drink.clone()))
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut state = self.inner.write().await;
        Ok(state.drinks.remove(&id).is_some())
    }
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS drink (
    id SERIAL PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    recipe JSONB NOT NULL
)";

#[derive(FromRow)]
struct DrinkRow {
    id: i32,
    title: String,
    recipe: SqlJson<Vec<Ingredient>>,
}

impl From<DrinkRow> for Drink {
    fn from(row: DrinkRow) -> Self {
        Drink {
            id: row.id,
            title: row.title,
            recipe: row.recipe.0,
        }
    }
}

#[derive(Clone)]
pub struct PgDrinkStore {
    db: PgPool,
}

impl PgDrinkStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.db)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Drop every drink and start over with a single "water" entry.
    pub async fn reset(&self) -> StoreResult<Drink> {
        sqlx::query("DROP TABLE IF EXISTS drink")
            .execute(&self.db)
            .await
            .map_err(db_error)?;
        self.ensure_schema().await?;
        self.insert(NewDrink {
            title: "water".to_string(),
            recipe: vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }],
        })
        .await
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

fn write_error(err: sqlx::Error, title: Option<&str>) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::DuplicateTitle(title.unwrap_or_default().to_string());
        }
    }
    db_error(err)
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    async fn list(&self) -> StoreResult<Vec<Drink>> {
        let rows = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drink ORDER BY id")
            .fetch_all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Drink::from).collect())
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Drink>> {
        let row = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drink WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Drink::from))
    }

    async fn insert(&self, drink: NewDrink) -> StoreResult<Drink> {
        let row = sqlx::query_as::<_, DrinkRow>(
            "INSERT INTO drink (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(&drink.title)
        .bind(SqlJson(&drink.recipe))
        .fetch_one(&self.db)
        .await
        .map_err(|err| write_error(err, Some(&drink.title)))?;
        Ok(row.into())
    }

    async fn update(&self, id: i32, changes: DrinkChanges) -> StoreResult<Option<Drink>> {
        let row = sqlx::query_as::<_, DrinkRow>(
            "UPDATE drink SET title = COALESCE($1, title), recipe = COALESCE($2, recipe)
             WHERE id = $3
             RETURNING id, title, recipe",
        )
        .bind(changes.title.as_deref())
        .bind(changes.recipe.as_ref().map(SqlJson))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| write_error(err, changes.title.as_deref()))?;
        Ok(row.map(Drink::from))
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM drink WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_drink(title: &str) -> NewDrink {
        NewDrink {
            title: title.to_string(),
            recipe: vec![Ingredient {
                name: "espresso".into(),
                color: "brown".into(),
                parts: 1,
            }],
        }
    }

    #[tokio::test]
    async fn memory_store_assigns_sequential_ids() {
        let store = InMemoryDrinkStore::new();
        let first = store.insert(new_drink("espresso")).await.unwrap();
        let second = store.insert(new_drink("ristretto")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_titles() {
        let store = InMemoryDrinkStore::new();
        store.insert(new_drink("espresso")).await.unwrap();
        let other = store.insert(new_drink("latte")).await.unwrap();

        let err = store.insert(new_drink("espresso")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTitle(_)));

        let rename = DrinkChanges {
            title: Some("espresso".into()),
            recipe: None,
        };
        let err = store.update(other.id, rename).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTitle(_)));
    }

    #[tokio::test]
    async fn memory_store_update_and_delete_report_missing_ids() {
        let store = InMemoryDrinkStore::new();
        let drink = store.insert(new_drink("espresso")).await.unwrap();

        let changes = DrinkChanges {
            title: Some("doppio".into()),
            recipe: None,
        };
        let updated = store.update(drink.id, changes.clone()).await.unwrap().unwrap();
        assert_eq!(updated.title, "doppio");
        assert_eq!(updated.recipe, drink.recipe);
        assert!(store.update(99, changes).await.unwrap().is_none());

        let taken = DrinkChanges {
            title: Some("doppio".into()),
            recipe: None,
        };
        assert!(store.update(99, taken).await.unwrap().is_none());

        assert!(store.delete(drink.id).await.unwrap());
        assert!(!store.delete(drink.id).await.unwrap());
        assert!(store.get(drink.id).await.unwrap().is_none());
    }
}

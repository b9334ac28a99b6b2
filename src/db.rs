//! # Database Module
//!
//! PostgreSQL persistence for profiles, inventory, shopping lists and saved
//! recipes. [`PgStore`] exposes the inventory and shopping tables through
//! [`ItemStore`]; profiles and saved recipes use free functions over the pool.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::kitchen_model::{
    Category, InventoryItem, Language, NewInventoryItem, Preferences, Recipe, ShoppingItem,
    UserProfile,
};
use crate::store::ItemStore;
use crate::subscription::SubscriptionTier;

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: Uuid,
    name: String,
    category: String,
    quantity: String,
    status: String,
    added_date: DateTime<Utc>,
    expiry_date: Option<NaiveDate>,
    days_until_expiry: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct ShoppingRow {
    id: Uuid,
    name: String,
    is_checked: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    subscription_tier: String,
    family_name: Option<String>,
    household_size: Option<i32>,
    dietary_restrictions: Option<Vec<String>>,
    language: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SavedRecipeRow {
    id: Uuid,
    title: String,
    description: String,
    ingredients: Vec<String>,
    instructions: Vec<String>,
    time_estimate: String,
    match_score: i32,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL,
            subscription_tier TEXT NOT NULL DEFAULT 'Free',
            family_name TEXT,
            household_size INTEGER DEFAULT 1,
            dietary_restrictions TEXT[] DEFAULT '{}',
            language TEXT DEFAULT 'en',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create profiles table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS inventory_items (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            quantity TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            added_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            expiry_date DATE,
            days_until_expiry BIGINT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create inventory_items table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS shopping_items (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            name TEXT NOT NULL,
            is_checked BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create shopping_items table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS saved_recipes (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            ingredients TEXT[] NOT NULL DEFAULT '{}',
            instructions TEXT[] NOT NULL DEFAULT '{}',
            time_estimate TEXT NOT NULL DEFAULT '',
            match_score INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create saved_recipes table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS inventory_items_user_idx ON inventory_items (user_id)")
        .execute(pool)
        .await
        .context("Failed to create inventory index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS shopping_items_user_idx ON shopping_items (user_id)")
        .execute(pool)
        .await
        .context("Failed to create shopping index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = anyhow::Error;

    fn try_from(row: InventoryRow) -> Result<Self> {
        Ok(InventoryItem {
            id: row.id,
            name: row.name,
            category: Category::parse_lenient(&row.category),
            quantity: row.quantity,
            status: row.status.parse().map_err(|e: String| anyhow!(e))?,
            added_date: row.added_date,
            expiry_date: row.expiry_date,
            days_until_expiry: row.days_until_expiry,
        })
    }
}

impl From<ShoppingRow> for ShoppingItem {
    fn from(row: ShoppingRow) -> Self {
        ShoppingItem {
            id: row.id,
            name: row.name,
            is_checked: row.is_checked,
        }
    }
}

impl From<SavedRecipeRow> for Recipe {
    fn from(row: SavedRecipeRow) -> Self {
        Recipe::new(&row.id.to_string(), &row.title)
            .with_ingredients(&row.ingredients)
            .with_instructions(&row.instructions)
            .with_match_score(i64::from(row.match_score))
            .with_description(&row.description)
            .with_time_estimate(&row.time_estimate)
    }
}

/// [`ItemStore`] backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        init_database_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn list_inventory(&self, user_id: Uuid) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            "SELECT id, name, category, quantity, status, added_date, expiry_date, days_until_expiry
             FROM inventory_items WHERE user_id = $1 ORDER BY added_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list inventory")?;

        rows.into_iter().map(InventoryItem::try_from).collect()
    }

    async fn add_inventory_item(&self, user_id: Uuid, item: NewInventoryItem) -> Result<InventoryItem> {
        let stored = item.into_item(Uuid::new_v4());
        info!(user_id = %user_id, name = %stored.name, "Creating inventory item");

        sqlx::query(
            "INSERT INTO inventory_items
                (id, user_id, name, category, quantity, status, added_date, expiry_date, days_until_expiry)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(stored.id)
        .bind(user_id)
        .bind(&stored.name)
        .bind(stored.category.as_str())
        .bind(&stored.quantity)
        .bind(stored.status.as_str())
        .bind(stored.added_date)
        .bind(stored.expiry_date)
        .bind(stored.days_until_expiry)
        .execute(&self.pool)
        .await
        .context("Failed to insert inventory item")?;

        Ok(stored)
    }

    async fn delete_inventory_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete inventory item")?;
        Ok(result.rows_affected() > 0)
    }

    async fn batch_delete_inventory(&self, user_id: Uuid, item_ids: &[Uuid]) -> Result<u64> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM inventory_items WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(item_ids)
            .execute(&self.pool)
            .await
            .context("Failed to batch delete inventory items")?;
        debug!(user_id = %user_id, removed = result.rows_affected(), "Batch deleted inventory items");
        Ok(result.rows_affected())
    }

    async fn list_shopping(&self, user_id: Uuid) -> Result<Vec<ShoppingItem>> {
        let rows = sqlx::query_as::<_, ShoppingRow>(
            "SELECT id, name, is_checked FROM shopping_items
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list shopping items")?;

        Ok(rows.into_iter().map(ShoppingItem::from).collect())
    }

    async fn add_shopping_item(&self, user_id: Uuid, name: &str) -> Result<ShoppingItem> {
        let item = ShoppingItem::new(name);
        sqlx::query("INSERT INTO shopping_items (id, user_id, name, is_checked) VALUES ($1, $2, $3, FALSE)")
            .bind(item.id)
            .bind(user_id)
            .bind(&item.name)
            .execute(&self.pool)
            .await
            .context("Failed to insert shopping item")?;
        Ok(item)
    }

    async fn set_shopping_checked(&self, user_id: Uuid, item_id: Uuid, checked: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE shopping_items SET is_checked = $1 WHERE id = $2 AND user_id = $3")
            .bind(checked)
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to update shopping item")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_shopping_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shopping_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete shopping item")?;
        Ok(result.rows_affected() > 0)
    }
}

/// Get a profile by id, creating a Free one if none exists
pub async fn get_or_create_profile(pool: &PgPool, user_id: Uuid, email: &str) -> Result<UserProfile> {
    if let Some(profile) = get_profile(pool, user_id).await? {
        return Ok(profile);
    }

    info!(user_id = %user_id, "Creating new profile");
    sqlx::query("INSERT INTO profiles (id, email) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to insert profile")?;

    get_profile(pool, user_id)
        .await?
        .ok_or_else(|| anyhow!("Profile {user_id} missing after insert"))
}

/// Read a profile by id
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<UserProfile>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, email, subscription_tier, family_name, household_size, dietary_restrictions, language
         FROM profiles WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read profile")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let subscription_tier = row
        .subscription_tier
        .parse::<SubscriptionTier>()
        .unwrap_or_default();
    let language: Language = row
        .language
        .as_deref()
        .and_then(|l| l.parse().ok())
        .unwrap_or_default();

    Ok(Some(UserProfile {
        id: row.id,
        email: row.email,
        subscription_tier,
        family_name: row.family_name.unwrap_or_default(),
        preferences: Preferences {
            dietary_restrictions: row.dietary_restrictions.unwrap_or_default(),
            household_size: row.household_size.map(|s| s.max(1) as u32).unwrap_or(1),
            language,
        },
    }))
}

/// Fields of a profile that a user may change; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub family_name: Option<String>,
    pub household_size: Option<u32>,
    pub dietary_restrictions: Option<Vec<String>>,
    pub language: Option<Language>,
}

/// Apply a partial profile update
pub async fn update_profile(pool: &PgPool, user_id: Uuid, update: &ProfileUpdate) -> Result<bool> {
    let household_size = update.household_size.map(|s| s.max(1) as i32);
    let result = sqlx::query(
        "UPDATE profiles SET
            family_name = COALESCE($2, family_name),
            household_size = COALESCE($3, household_size),
            dietary_restrictions = COALESCE($4, dietary_restrictions),
            language = COALESCE($5, language)
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(update.family_name.as_deref())
    .bind(household_size)
    .bind(update.dietary_restrictions.as_deref())
    .bind(update.language.map(|l| l.code()))
    .execute(pool)
    .await
    .context("Failed to update profile")?;
    Ok(result.rows_affected() > 0)
}

/// Set the subscription tier of a profile
///
/// Called after a confirmed checkout or cancellation, or explicitly in sandbox
/// mode. Never called as a fallback for a failed billing request.
pub async fn set_subscription_tier(pool: &PgPool, user_id: Uuid, tier: SubscriptionTier) -> Result<bool> {
    info!(user_id = %user_id, tier = %tier, "Setting subscription tier");
    let result = sqlx::query("UPDATE profiles SET subscription_tier = $1 WHERE id = $2")
        .bind(tier.as_str())
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update subscription tier")?;
    Ok(result.rows_affected() > 0)
}

/// Store a tier for a user, creating the profile row if it does not exist yet
///
/// Returns the profile as stored. A created profile has an empty email until
/// the account signs in with one.
pub async fn apply_subscription_tier(pool: &PgPool, user_id: Uuid, tier: SubscriptionTier) -> Result<UserProfile> {
    info!(user_id = %user_id, tier = %tier, "Applying subscription tier");
    sqlx::query(
        "INSERT INTO profiles (id, email, subscription_tier) VALUES ($1, '', $2)
         ON CONFLICT (id) DO UPDATE SET subscription_tier = EXCLUDED.subscription_tier",
    )
    .bind(user_id)
    .bind(tier.as_str())
    .execute(pool)
    .await
    .context("Failed to store subscription tier")?;

    get_profile(pool, user_id)
        .await?
        .ok_or_else(|| anyhow!("Profile {user_id} missing after tier update"))
}

/// Save a recipe for a user, returning the stored recipe id
pub async fn save_recipe(pool: &PgPool, user_id: Uuid, recipe: &Recipe) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO saved_recipes
            (id, user_id, title, description, ingredients, instructions, time_estimate, match_score)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(id)
    .bind(user_id)
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.ingredients)
    .bind(&recipe.instructions)
    .bind(&recipe.time_estimate)
    .bind(i32::from(recipe.match_score))
    .execute(pool)
    .await
    .context("Failed to save recipe")?;

    info!(user_id = %user_id, recipe_id = %id, "Recipe saved");
    Ok(id)
}

/// A user's saved recipes, newest first
pub async fn list_saved_recipes(pool: &PgPool, user_id: Uuid) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, SavedRecipeRow>(
        "SELECT id, title, description, ingredients, instructions, time_estimate, match_score
         FROM saved_recipes WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list saved recipes")?;

    Ok(rows.into_iter().map(Recipe::from).collect())
}

/// Delete a saved recipe
pub async fn delete_saved_recipe(pool: &PgPool, user_id: Uuid, recipe_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM saved_recipes WHERE id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete saved recipe")?;
    Ok(result.rows_affected() > 0)
}

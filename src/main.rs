use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use scandibox::availability::partition_missing_ingredients;
use scandibox::billing::billing_from_config;
use scandibox::config::AppConfig;
use scandibox::conversion::{parse_expiry_date, ManualEntry};
use scandibox::db::{self, PgStore};
use scandibox::errors::KitchenError;
use scandibox::inference::inference_from_config;
use scandibox::kitchen_model::{Category, Language, PlanDay, Preferences, Recipe};
use scandibox::localization::{describe_error, t, t_args};
use scandibox::logging::init_logging;
use scandibox::meal_plan::WeeklyPlan;
use scandibox::store::{inventory_snapshot, FileStore, ItemStore};
use scandibox::subscription::{effective_tier, subscription_plans, ExploreLedger, Feature, SubscriptionTier};
use scandibox::workflows::{self, ScanMode};

const DEFAULT_TRIP_SHELF_LIFE_DAYS: i64 = 7;

#[derive(Parser)]
#[command(name = "scandibox", version, about = "Kitchen inventory and shopping list reconciliation")]
struct Cli {
    /// Account the command acts on
    #[arg(long)]
    user: Uuid,

    /// Message language (en, no)
    #[arg(long, default_value = "en")]
    lang: Language,

    /// Run as another tier; only accepted with SANDBOX_MODE
    #[arg(long)]
    tier: Option<SubscriptionTier>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List inventory
    Inventory,
    /// Add an item by hand
    AddItem {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Other")]
        category: Category,
        #[arg(long, default_value = "1")]
        quantity: String,
        /// YYYY-MM-DD
        #[arg(long)]
        expiry: Option<String>,
    },
    /// Show which ingredients of a recipe JSON file are in stock
    CheckRecipe { file: PathBuf },
    /// Add the missing ingredients of a recipe JSON file to the shopping list
    AddMissing { file: PathBuf },
    /// Move checked shopping items into inventory
    FinishTrip {
        /// Expiry date for the new items (YYYY-MM-DD), one week out by default
        #[arg(long)]
        expiry: Option<String>,
    },
    /// List subscription plans
    Plans,
    /// Start checkout for a plan
    Checkout {
        #[arg(long)]
        plan: SubscriptionTier,
        #[arg(long, default_value = "http://localhost:3000")]
        return_url: String,
    },
    /// Cancel the paid subscription
    CancelSubscription {
        #[arg(long)]
        access_token: String,
    },
    /// Put a recipe JSON file on the weekly plan
    PlanRecipe {
        file: PathBuf,
        #[arg(long)]
        day: PlanDay,
        #[arg(long, default_value = "meal_plan.json")]
        plan_file: PathBuf,
    },
    /// Fill the weekly plan with suggested recipes
    MealPlan {
        #[arg(long, default_value = "meal_plan.json")]
        plan_file: PathBuf,
    },
    /// Suggest recipes from the current inventory
    Explore,
    /// Add items recognised in a photo of food or a receipt
    Scan {
        image: PathBuf,
        #[arg(long, default_value = "food")]
        mode: ScanMode,
    },
    /// Add suggested items to the shopping list
    Replenish,
    /// Nutrition notes for a food
    Nutrition {
        #[arg(long)]
        item: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(config.json_logs)?;

    let cli = Cli::parse();
    info!("Starting ScandiBox");

    if let Err(err) = run(&cli, &config).await {
        eprintln!("{}", describe_error(cli.lang, &err));
        std::process::exit(1);
    }
    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<(Box<dyn ItemStore>, Option<PgPool>), KitchenError> {
    match config.database_url.as_deref() {
        Some(url) => {
            info!("Connecting to database");
            let store = PgStore::connect(url).await?;
            let pool = store.pool().clone();
            Ok((Box::new(store), Some(pool)))
        }
        None => {
            let path = config.local_store_path();
            warn!(path = %path.display(), "DATABASE_URL is not set, keeping items in a local file");
            Ok((Box::new(FileStore::new(path)), None))
        }
    }
}

async fn resolve_tier(cli: &Cli, config: &AppConfig, pool: Option<&PgPool>) -> Result<SubscriptionTier, KitchenError> {
    let stored = match pool {
        Some(pool) => db::get_profile(pool, cli.user)
            .await?
            .map(|p| p.subscription_tier)
            .unwrap_or_default(),
        None => SubscriptionTier::Free,
    };
    effective_tier(stored, cli.tier, config.sandbox_mode)
}

async fn load_preferences(user: Uuid, pool: Option<&PgPool>) -> Result<Preferences, KitchenError> {
    match pool {
        Some(pool) => Ok(db::get_profile(pool, user)
            .await?
            .map(|p| p.preferences)
            .unwrap_or_default()),
        None => Ok(Preferences::default()),
    }
}

/// Store a tier change when a database is available
async fn store_tier(
    pool: Option<&PgPool>,
    user: Uuid,
    tier: SubscriptionTier,
) -> Result<(), KitchenError> {
    match pool {
        Some(pool) => {
            db::apply_subscription_tier(pool, user, tier).await?;
        }
        None => warn!(tier = %tier, "No database configured; tier not stored"),
    }
    Ok(())
}

fn read_recipe(path: &Path) -> Result<Recipe, KitchenError> {
    let content = fs::read_to_string(path)
        .map_err(|e| KitchenError::InvalidInput(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| KitchenError::InvalidInput(format!("{}: {e}", path.display())))
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<(), KitchenError> {
    let lang = cli.lang;
    let user = cli.user;
    let (store, pool) = open_store(config).await?;
    let store = store.as_ref();
    let now = Utc::now();

    match &cli.command {
        Command::Inventory => {
            let items = inventory_snapshot(store, user).await?;
            println!("{}", t(lang, "inventory-title"));
            if items.is_empty() {
                println!("{}", t(lang, "inventory-empty"));
            }
            for item in items {
                println!("  {item}");
            }
        }
        Command::AddItem {
            name,
            category,
            quantity,
            expiry,
        } => {
            let entry = ManualEntry {
                name: name.clone(),
                category: *category,
                quantity: quantity.clone(),
                expiry_date: expiry.as_deref().map(parse_expiry_date).transpose()?,
            };
            let item = workflows::add_manual_item(store, user, &entry, now).await?;
            println!("{}", t_args(lang, "item-added", &[("name", item.name.as_str())]));
        }
        Command::CheckRecipe { file } => {
            let recipe = read_recipe(file)?;
            let inventory = inventory_snapshot(store, user).await?;
            let partition = partition_missing_ingredients(&recipe.ingredients, &inventory);
            let present = partition.present.len().to_string();
            let total = recipe.ingredients.len().to_string();
            println!(
                "{}",
                t_args(
                    lang,
                    "recipe-status",
                    &[
                        ("present", present.as_str()),
                        ("total", total.as_str()),
                        ("title", recipe.title.as_str()),
                    ],
                )
            );
            if !partition.present.is_empty() {
                println!("{}", t(lang, "recipe-present-header"));
                partition.present.iter().for_each(|i| println!("  {i}"));
            }
            if !partition.missing.is_empty() {
                println!("{}", t(lang, "recipe-missing-header"));
                partition.missing.iter().for_each(|i| println!("  {i}"));
            }
        }
        Command::AddMissing { file } => {
            let recipe = read_recipe(file)?;
            let outcome = workflows::add_missing_ingredients(store, user, &recipe).await?;
            let count = outcome.added.len().to_string();
            println!("{}", t_args(lang, "missing-added", &[("count", count.as_str())]));
        }
        Command::FinishTrip { expiry } => {
            let tier = resolve_tier(cli, config, pool.as_ref()).await?;
            let target = match expiry {
                Some(raw) => parse_expiry_date(raw)?,
                None => now.date_naive() + Duration::days(DEFAULT_TRIP_SHELF_LIFE_DAYS),
            };
            let outcome = workflows::complete_shopping_trip(store, user, tier, target, now).await?;
            let count = outcome.converted.len().to_string();
            println!("{}", t_args(lang, "trip-complete", &[("count", count.as_str())]));
        }
        Command::Plans => {
            for plan in subscription_plans(&config.price_ids) {
                let price = plan.price.to_string();
                println!(
                    "{}",
                    t_args(lang, "plan-line", &[("name", plan.name.as_str()), ("price", price.as_str())])
                );
                plan.features.iter().for_each(|f| println!("  - {f}"));
            }
        }
        Command::Checkout { plan, return_url } => {
            let plans = subscription_plans(&config.price_ids);
            let selected = plans
                .iter()
                .find(|p| p.tier == *plan)
                .ok_or_else(|| KitchenError::InvalidInput(format!("No paid plan for tier {plan}")))?;
            let price_id = selected.require_price_id()?;

            let billing = billing_from_config(config);
            let session = billing.start_checkout(price_id, return_url).await?;
            println!("{}", session.session_id);

            // Sandbox sessions never complete a payment, so the tier is set here
            if session.sandbox {
                store_tier(pool.as_ref(), user, selected.tier).await?;
                println!("{}", t_args(lang, "plan-activated", &[("tier", selected.tier.as_str())]));
            }
        }
        Command::CancelSubscription { access_token } => {
            let billing = billing_from_config(config);
            let tier = workflows::cancel_subscription(billing.as_ref(), access_token).await?;
            store_tier(pool.as_ref(), user, tier).await?;
            println!("{}", t_args(lang, "subscription-cancelled", &[("tier", tier.as_str())]));
        }
        Command::PlanRecipe {
            file,
            day,
            plan_file,
        } => {
            let recipe = read_recipe(file)?;
            let mut plan = WeeklyPlan::load(plan_file)?;
            let id = plan.add_recipe(&recipe, *day);
            plan.save(plan_file)?;
            println!("{id}");
        }
        Command::MealPlan { plan_file } => {
            let tier = resolve_tier(cli, config, pool.as_ref()).await?;
            let preferences = load_preferences(user, pool.as_ref()).await?;
            let inference = inference_from_config(config);
            let plan =
                workflows::generate_meal_plan(store, inference.as_ref(), user, tier, &preferences).await?;
            plan.save(plan_file)?;

            let count = plan.entries().len().to_string();
            println!("{}", t_args(lang, "meal-plan-generated", &[("count", count.as_str())]));
            for recipe in plan.entries() {
                let day = recipe.day.map(|d| d.to_string()).unwrap_or_default();
                println!("  {day}: {}", recipe.title);
            }
        }
        Command::Explore => {
            let tier = resolve_tier(cli, config, pool.as_ref()).await?;
            let preferences = load_preferences(user, pool.as_ref()).await?;
            let inference = inference_from_config(config);
            let ledger_path = config.explore_usage_path();
            let mut ledger = ExploreLedger::load(&ledger_path)?;

            let outcome = workflows::explore_recipes(
                store,
                inference.as_ref(),
                user,
                tier,
                &preferences,
                ledger.usage(user),
                now.date_naive(),
            )
            .await?;
            ledger.set_usage(user, outcome.usage);
            ledger.save(&ledger_path)?;

            if outcome.recipes.is_empty() {
                println!("{}", t(lang, "explore-empty"));
            }
            for recipe in &outcome.recipes {
                let score = recipe.match_score.to_string();
                println!(
                    "{}",
                    t_args(
                        lang,
                        "explore-recipe",
                        &[
                            ("title", recipe.title.as_str()),
                            ("score", score.as_str()),
                            ("time", recipe.time_estimate.as_str()),
                        ],
                    )
                );
            }
            if !tier.allows(Feature::UnlimitedExplore) {
                let remaining = outcome.usage.remaining(now.date_naive()).to_string();
                println!("{}", t_args(lang, "explore-remaining", &[("remaining", remaining.as_str())]));
            }
        }
        Command::Scan { image, mode } => {
            let tier = resolve_tier(cli, config, pool.as_ref()).await?;
            let bytes = fs::read(image)
                .map_err(|e| KitchenError::InvalidInput(format!("{}: {e}", image.display())))?;
            let inference = inference_from_config(config);
            let items = workflows::scan_and_import(
                store,
                inference.as_ref(),
                user,
                tier,
                *mode,
                &STANDARD.encode(bytes),
                now,
            )
            .await?;

            if items.is_empty() {
                println!("{}", t(lang, "scan-empty"));
            } else {
                let count = items.len().to_string();
                println!("{}", t_args(lang, "scan-complete", &[("count", count.as_str())]));
                items.iter().for_each(|i| println!("  {i}"));
            }
        }
        Command::Replenish => {
            let tier = resolve_tier(cli, config, pool.as_ref()).await?;
            let inference = inference_from_config(config);
            let added = workflows::smart_replenish(store, inference.as_ref(), user, tier).await?;
            let count = added.len().to_string();
            println!("{}", t_args(lang, "replenish-added", &[("count", count.as_str())]));
            added.iter().for_each(|i| println!("  {}", i.name));
        }
        Command::Nutrition { item } => {
            let tier = resolve_tier(cli, config, pool.as_ref()).await?;
            let inference = inference_from_config(config);
            let report = workflows::analyze_nutrition(inference.as_ref(), tier, item).await?;
            println!("{}", t_args(lang, "nutrition-calories", &[("calories", report.calories.as_str())]));
            println!("{}", t_args(lang, "nutrition-benefits", &[("benefits", report.benefits.as_str())]));
            if let Some(warning) = report.warning.as_deref() {
                println!("{}", t_args(lang, "nutrition-warning", &[("warning", warning)]));
            }
        }
    }

    Ok(())
}

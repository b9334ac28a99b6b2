//! # ScandiBox
//!
//! Kitchen inventory tracking with shopping-list reconciliation: decides
//! which recipe ingredients are already in stock, turns finished shopping
//! trips into inventory records and proposes deductions after cooking.
//! Storage, generative inference and billing sit behind async traits.

pub mod availability;
pub mod billing;
pub mod config;
pub mod conversion;
pub mod cooking_session;
pub mod db;
pub mod errors;
pub mod inference;
pub mod kitchen_model;
pub mod localization;
pub mod logging;
pub mod meal_plan;
pub mod store;
pub mod subscription;
pub mod text_processing;
pub mod workflows;

//! Serde data file structs for the catalog, value streams and run files.
//!
//! These structs define the on-disk format. They are deserialized from RON,
//! JSON, or TOML data files and then resolved into core types by the loader.

use std::collections::BTreeMap;

use serde::Deserialize;
use valstream_core::line::SourcingStrategy;

// ===========================================================================
// Catalog: Recipes
// ===========================================================================

/// A ticker and count, in short tuple form or with explicit fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaterialData {
    /// Short form: `("FE", 4.0)`.
    Short(String, f64),
    /// Full form: `(ticker: "FE", count: 4.0)`.
    Full { ticker: String, count: f64 },
}

impl MaterialData {
    pub fn ticker(&self) -> &str {
        match self {
            MaterialData::Short(ticker, _) | MaterialData::Full { ticker, .. } => ticker,
        }
    }

    pub fn count(&self) -> f64 {
        match self {
            MaterialData::Short(_, count) | MaterialData::Full { count, .. } => *count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub id: String,
    /// Building ticker the recipe runs on.
    pub line: String,
    #[serde(default)]
    pub inputs: Vec<MaterialData>,
    pub outputs: Vec<MaterialData>,
    /// Duration string, e.g. `"1:0:0:0"` or `"6:0:0"`.
    pub time: String,
}

/// Wrapper for TOML recipe files (`[[recipes]]`).
#[derive(Debug, Clone, Deserialize)]
pub struct TomlRecipes {
    pub recipes: Vec<RecipeData>,
}

// ===========================================================================
// Catalog: Buildings
// ===========================================================================

fn default_kind() -> String {
    "PRODUCTION".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub ticker: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub area: u32,
    #[serde(default)]
    pub expertise: Option<String>,
    /// Worker type to headcount per building.
    #[serde(default)]
    pub workers: BTreeMap<String, u32>,
    #[serde(default)]
    pub reclaimable: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlBuildings {
    pub buildings: Vec<BuildingData>,
}

// ===========================================================================
// Catalog: Sites
// ===========================================================================

fn default_basis() -> f64 {
    100.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeedData {
    pub ticker: String,
    /// Units per `basis` workers per day.
    pub rate: f64,
    #[serde(default = "default_basis")]
    pub basis: f64,
    #[serde(default)]
    pub essential: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerProfileData {
    pub efficiency: f64,
    #[serde(default)]
    pub needs: Vec<NeedData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteData {
    pub name: String,
    pub workers: BTreeMap<String, WorkerProfileData>,
    #[serde(default)]
    pub experts: BTreeMap<String, u32>,
    #[serde(default)]
    pub soil_fertility: f64,
    #[serde(default)]
    pub cogc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlSites {
    pub sites: Vec<SiteData>,
}

// ===========================================================================
// Catalog: Bonus tables
// ===========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BonusData {
    #[serde(default)]
    pub expert_factors: Vec<f64>,
    #[serde(default)]
    pub cogc_worker_bonus: BTreeMap<String, f64>,
    #[serde(default)]
    pub cogc_industry_bonus: BTreeMap<String, f64>,
}

// ===========================================================================
// Value streams
// ===========================================================================

fn default_one() -> u32 {
    1
}

fn default_condition() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueData {
    pub recipe: String,
    #[serde(default = "default_one")]
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineData {
    pub id: String,
    /// Building ticker.
    pub line: String,
    pub site: String,
    #[serde(default = "default_one")]
    pub count: u32,
    #[serde(default = "default_condition")]
    pub condition: f64,
    pub queue: Vec<QueueData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamData {
    #[serde(default)]
    pub description: String,
    #[serde(alias = "productionLines")]
    pub lines: Vec<LineData>,
}

// ===========================================================================
// Run files
// ===========================================================================

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SourcingData {
    #[serde(default)]
    pub inputs: SourcingStrategy,
    #[serde(default)]
    pub essentials: SourcingStrategy,
    #[serde(default)]
    pub non_essentials: SourcingStrategy,
}

/// Top-level run description. Paths may contain `{date}` and are relative to
/// the run file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct RunFileData {
    pub description: String,
    pub valstream: String,
    pub inventory: String,
    pub exchange: String,
    pub currency: String,
    pub duration: String,
    #[serde(default)]
    pub sourcing: SourcingData,
    #[serde(default)]
    pub data_dir: Option<String>,
}

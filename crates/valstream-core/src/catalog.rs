use std::collections::{BTreeMap, HashMap};

use crate::clock::Duration;
use crate::fixed::Quantity;

/// One ticker and an amount of it, used for recipe inputs and outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCount {
    pub ticker: String,
    pub count: Quantity,
}

impl MaterialCount {
    pub fn new(ticker: impl Into<String>, count: Quantity) -> Self {
        Self {
            ticker: ticker.into(),
            count,
        }
    }
}

/// A production template: what one run of a recipe consumes and produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDef {
    pub id: String,
    /// Ticker of the building type that runs this recipe.
    pub line: String,
    pub inputs: Vec<MaterialCount>,
    pub outputs: Vec<MaterialCount>,
    /// Nominal time for a single run at efficiency 1.0.
    pub time: Duration,
}

/// Workers of one type required to staff a single building.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSlot {
    pub worker_type: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDef {
    pub ticker: String,
    pub kind: String,
    pub area: u32,
    /// Expertise category (e.g. `AGRICULTURE`), drives expert and COGC bonuses.
    pub expertise: Option<String>,
    pub workers: Vec<WorkerSlot>,
    /// Materials recovered when the building is demolished.
    pub reclaimable: BTreeMap<String, Quantity>,
}

/// A consumable that a worker type needs, as units per `basis` workers per day.
#[derive(Debug, Clone, PartialEq)]
pub struct Need {
    pub ticker: String,
    pub rate: f64,
    pub basis: f64,
    pub essential: bool,
}

/// Need profile of one worker type at one site.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerProfile {
    /// Share of full efficiency that essentials alone provide.
    pub efficiency: f64,
    pub needs: Vec<Need>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteDef {
    pub name: String,
    pub workers: BTreeMap<String, WorkerProfile>,
    /// Expert headcount per expertise category.
    pub experts: BTreeMap<String, u32>,
    pub soil_fertility: f64,
    /// The site's active COGC program, if any.
    pub cogc_program: Option<String>,
}

/// Global bonus tables shared by all sites.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BonusTables {
    /// Bonus by expert count; index 0 is "no experts".
    pub expert_factors: Vec<f64>,
    pub cogc_worker_bonus: BTreeMap<String, f64>,
    pub cogc_industry_bonus: BTreeMap<String, f64>,
}

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    recipes: HashMap<String, RecipeDef>,
    buildings: HashMap<String, BuildingDef>,
    sites: HashMap<String, SiteDef>,
    bonuses: BonusTables,
    duplicates: Vec<(&'static str, String)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_recipe(&mut self, recipe: RecipeDef) -> &mut Self {
        if self.recipes.contains_key(&recipe.id) {
            self.duplicates.push(("recipe", recipe.id.clone()));
        }
        self.recipes.insert(recipe.id.clone(), recipe);
        self
    }

    pub fn register_building(&mut self, building: BuildingDef) -> &mut Self {
        if self.buildings.contains_key(&building.ticker) {
            self.duplicates.push(("building", building.ticker.clone()));
        }
        self.buildings.insert(building.ticker.clone(), building);
        self
    }

    pub fn register_site(&mut self, site: SiteDef) -> &mut Self {
        if self.sites.contains_key(&site.name) {
            self.duplicates.push(("site", site.name.clone()));
        }
        self.sites.insert(site.name.clone(), site);
        self
    }

    pub fn bonuses(&mut self, bonuses: BonusTables) -> &mut Self {
        self.bonuses = bonuses;
        self
    }

    /// Validate cross references and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some((kind, name)) = self.duplicates.into_iter().next() {
            return Err(CatalogError::Duplicate { kind, name });
        }

        for recipe in self.recipes.values() {
            if !self.buildings.contains_key(&recipe.line) {
                return Err(CatalogError::InvalidBuildingRef {
                    recipe: recipe.id.clone(),
                    building: recipe.line.clone(),
                });
            }
        }

        Ok(Catalog {
            recipes: self.recipes,
            buildings: self.buildings,
            sites: self.sites,
            bonuses: self.bonuses,
        })
    }
}

/// Immutable recipe, building and site lookup. Frozen after build().
#[derive(Debug, Default)]
pub struct Catalog {
    recipes: HashMap<String, RecipeDef>,
    buildings: HashMap<String, BuildingDef>,
    sites: HashMap<String, SiteDef>,
    bonuses: BonusTables,
}

impl Catalog {
    pub fn recipe(&self, id: &str) -> Result<&RecipeDef, CatalogError> {
        self.recipes
            .get(id)
            .ok_or_else(|| CatalogError::UnknownRecipe(id.to_string()))
    }

    pub fn building(&self, ticker: &str) -> Result<&BuildingDef, CatalogError> {
        self.buildings
            .get(ticker)
            .ok_or_else(|| CatalogError::UnknownBuilding(ticker.to_string()))
    }

    pub fn site(&self, name: &str) -> Result<&SiteDef, CatalogError> {
        self.sites
            .get(name)
            .ok_or_else(|| CatalogError::UnknownSite(name.to_string()))
    }

    pub fn worker_profile(&self, site: &str, worker_type: &str) -> Result<&WorkerProfile, CatalogError> {
        self.site(site)?
            .workers
            .get(worker_type)
            .ok_or_else(|| CatalogError::UnknownWorkerType {
                site: site.to_string(),
                worker_type: worker_type.to_string(),
            })
    }

    pub fn bonuses(&self) -> &BonusTables {
        &self.bonuses
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("recipe {0} not found")]
    UnknownRecipe(String),
    #[error("building {0} not found")]
    UnknownBuilding(String),
    #[error("site {0} not found")]
    UnknownSite(String),
    #[error("worker type {worker_type} not defined for site {site}")]
    UnknownWorkerType { site: String, worker_type: String },
    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
    #[error("recipe {recipe} references unknown building {building}")]
    InvalidBuildingRef { recipe: String, building: String },
}

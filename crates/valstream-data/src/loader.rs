//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the catalog and everything else a run needs.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, `{date}` path
//! substitution and deserialization helpers, plus the two entry points
//! [`load_catalog`] and [`load_run`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use valstream_core::catalog::{
    BonusTables, BuildingDef, Catalog, CatalogBuilder, CatalogError, MaterialCount, Need, RecipeDef, SiteDef,
    WorkerProfile, WorkerSlot,
};
use valstream_core::clock::{Duration, DurationError};
use valstream_core::fixed::{Quantity, try_qty};
use valstream_core::inventory::Inventory;
use valstream_core::line::{LineSpec, QueueEntry, Sourcing};
use valstream_core::market::{Market, MarketError, PriceFeed};
use valstream_core::stream::StreamSpec;

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A value parsed but is out of range.
    #[error("invalid value in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    #[error("bad duration in {file}: {source}")]
    Duration {
        file: PathBuf,
        #[source]
        source: DurationError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Market(#[from] MarketError),

    /// An I/O error occurred.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// Replace every `{date}` in `template` with `date`.
pub fn substitute_date(template: &str, date: &str) -> String {
    template.replace("{date}", date)
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn read(path: &Path) -> Result<(Format, String), DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((format, content))
}

fn parse<T: DeserializeOwned>(format: Format, content: &str, path: &Path) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let (format, content) = read(path)?;
    parse(format, &content, path)
}

/// Deserialize a list from a file. TOML has no top-level arrays, so TOML
/// files hold the list in a `W` wrapper table; RON and JSON hold it bare.
pub fn deserialize_list<T, W>(path: &Path, unwrap: impl FnOnce(W) -> Vec<T>) -> Result<Vec<T>, DataLoadError>
where
    T: DeserializeOwned,
    W: DeserializeOwned,
{
    let (format, content) = read(path)?;
    match format {
        Format::Toml => parse::<W>(format, &content, path).map(unwrap),
        _ => parse(format, &content, path),
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Index `items` by name, failing on the first duplicate.
fn index_by_name<V>(items: Vec<V>, name: impl Fn(&V) -> &str, file: &Path) -> Result<HashMap<String, V>, DataLoadError> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let key = name(&item).to_string();
        if map.contains_key(&key) {
            return Err(DataLoadError::DuplicateName { file: file.to_path_buf(), name: key });
        }
        map.insert(key, item);
    }
    Ok(map)
}

fn parse_duration(spec: &str, file: &Path) -> Result<Duration, DataLoadError> {
    Duration::parse(spec).map_err(|source| DataLoadError::Duration {
        file: file.to_path_buf(),
        source,
    })
}

fn invalid(file: &Path, detail: String) -> DataLoadError {
    DataLoadError::Invalid {
        file: file.to_path_buf(),
        detail,
    }
}

/// A non-negative count that fits in a [`Quantity`].
fn quantity(value: f64, what: &str, file: &Path) -> Result<Quantity, DataLoadError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(invalid(file, format!("{what} must be a non-negative number, got {value}")));
    }
    try_qty(value).ok_or_else(|| invalid(file, format!("{what} is out of range, got {value}")))
}

fn in_range(value: f64, min: f64, max: f64, what: &str, file: &Path) -> Result<f64, DataLoadError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(file, format!("{what} must be within [{min}, {max}], got {value}")))
    }
}

fn need(data: NeedData, owner: &str, file: &Path) -> Result<Need, DataLoadError> {
    let what = format!("{owner} need for {}", data.ticker);
    quantity(data.rate, &format!("{what}: rate"), file)?;
    if !(data.basis.is_finite() && data.basis > 0.0) {
        return Err(invalid(file, format!("{what}: basis must be positive, got {}", data.basis)));
    }
    Ok(Need {
        ticker: data.ticker,
        rate: data.rate,
        basis: data.basis,
        essential: data.essential,
    })
}

// ===========================================================================
// Catalog
// ===========================================================================

fn materials(items: &[MaterialData], owner: &str, file: &Path) -> Result<Vec<MaterialCount>, DataLoadError> {
    items
        .iter()
        .map(|m| {
            let count = quantity(m.count(), &format!("{owner} count of {}", m.ticker()), file)?;
            Ok(MaterialCount::new(m.ticker(), count))
        })
        .collect()
}

/// Load `recipes`, `buildings` and `sites` (required) and `bonuses`
/// (optional) from `dir` into a [`Catalog`].
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let buildings_path = require_data_file(dir, "buildings")?;
    let buildings = index_by_name(
        deserialize_list(&buildings_path, |w: TomlBuildings| w.buildings)?,
        |b: &BuildingData| &b.ticker,
        &buildings_path,
    )?;

    let recipes_path = require_data_file(dir, "recipes")?;
    let recipes = index_by_name(
        deserialize_list(&recipes_path, |w: TomlRecipes| w.recipes)?,
        |r: &RecipeData| &r.id,
        &recipes_path,
    )?;

    let sites_path = require_data_file(dir, "sites")?;
    let sites = index_by_name(
        deserialize_list(&sites_path, |w: TomlSites| w.sites)?,
        |s: &SiteData| &s.name,
        &sites_path,
    )?;

    let bonuses: BonusData = match find_data_file(dir, "bonuses")? {
        Some(path) => deserialize_file(&path)?,
        None => BonusData::default(),
    };

    let mut builder = CatalogBuilder::new();

    for recipe in recipes.values() {
        resolve_name(&buildings, &recipe.line, &recipes_path, "building")?;
        builder.register_recipe(RecipeDef {
            id: recipe.id.clone(),
            line: recipe.line.clone(),
            inputs: materials(&recipe.inputs, &recipe.id, &recipes_path)?,
            outputs: materials(&recipe.outputs, &recipe.id, &recipes_path)?,
            time: parse_duration(&recipe.time, &recipes_path)?,
        });
    }

    for building in buildings.into_values() {
        let mut reclaimable = BTreeMap::new();
        for (ticker, count) in building.reclaimable {
            let count = quantity(count, &format!("{} reclaimable {ticker}", building.ticker), &buildings_path)?;
            reclaimable.insert(ticker, count);
        }
        builder.register_building(BuildingDef {
            ticker: building.ticker,
            kind: building.kind,
            area: building.area,
            expertise: building.expertise,
            workers: building
                .workers
                .into_iter()
                .map(|(worker_type, count)| WorkerSlot { worker_type, count })
                .collect(),
            reclaimable,
        });
    }

    for site in sites.into_values() {
        let mut workers = BTreeMap::new();
        for (worker_type, profile) in site.workers {
            let owner = format!("{} {worker_type}", site.name);
            let efficiency = in_range(profile.efficiency, 0.0, 1.0, &format!("{owner} efficiency"), &sites_path)?;
            let needs = profile
                .needs
                .into_iter()
                .map(|n| need(n, &owner, &sites_path))
                .collect::<Result<Vec<_>, _>>()?;
            workers.insert(worker_type, WorkerProfile { efficiency, needs });
        }
        builder.register_site(SiteDef {
            name: site.name,
            workers,
            experts: site.experts,
            soil_fertility: site.soil_fertility,
            cogc_program: site.cogc,
        });
    }

    builder.bonuses(BonusTables {
        expert_factors: bonuses.expert_factors,
        cogc_worker_bonus: bonuses.cogc_worker_bonus,
        cogc_industry_bonus: bonuses.cogc_industry_bonus,
    });

    let catalog = builder.build()?;
    debug!(
        dir = %dir.display(),
        recipes = catalog.recipe_count(),
        buildings = catalog.building_count(),
        sites = catalog.site_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

// ===========================================================================
// Streams, inventories and price feeds
// ===========================================================================

pub fn load_stream(path: &Path) -> Result<StreamSpec, DataLoadError> {
    let data: StreamData = deserialize_file(path)?;
    let lines = data
        .lines
        .into_iter()
        .map(|line| LineSpec {
            id: line.id,
            line_type: line.line,
            site: line.site,
            building_count: line.count,
            condition: line.condition,
            queue: line
                .queue
                .into_iter()
                .map(|q| QueueEntry {
                    recipe: q.recipe,
                    count: q.count,
                })
                .collect(),
        })
        .collect();
    Ok(StreamSpec {
        description: data.description,
        lines,
    })
}

/// Load a ticker to count table. Negative counts are rejected.
pub fn load_inventory(path: &Path) -> Result<Inventory, DataLoadError> {
    let counts: BTreeMap<String, f64> = deserialize_file(path)?;
    let mut inventory = Inventory::new();
    for (ticker, count) in counts {
        let count = quantity(count, &format!("inventory count of {ticker}"), path)?;
        inventory.add(ticker, count);
    }
    Ok(inventory)
}

pub fn load_price_feed(path: &Path) -> Result<PriceFeed, DataLoadError> {
    deserialize_file(path)
}

// ===========================================================================
// Run files
// ===========================================================================

/// Everything needed to construct and run a value stream.
#[derive(Debug)]
pub struct RunSetup {
    pub description: String,
    pub config_date: String,
    pub catalog: Catalog,
    pub stream: StreamSpec,
    pub inventory: Inventory,
    pub market: Market,
    pub duration: Duration,
    pub sourcing: Sourcing,
}

/// Load a run file and every file it references, substituting `{date}` in
/// referenced paths. Relative paths resolve against the run file's directory.
pub fn load_run(run_file: &Path, date: &str) -> Result<RunSetup, DataLoadError> {
    let run: RunFileData = deserialize_file(run_file)?;
    let base = run_file.parent().unwrap_or_else(|| Path::new("."));
    let resolve = |template: &str| base.join(substitute_date(template, date));

    let stream_path = resolve(&run.valstream);
    let inventory_path = resolve(&run.inventory);
    let exchange_path = resolve(&run.exchange);
    let data_dir = run.data_dir.as_deref().map_or_else(|| base.to_path_buf(), resolve);

    info!(
        description = %run.description,
        config_date = date,
        valstream = %stream_path.display(),
        inventory = %inventory_path.display(),
        exchange = %exchange_path.display(),
        currency = %run.currency,
        duration = %run.duration,
        "loading run"
    );

    let catalog = load_catalog(&data_dir)?;
    let stream = load_stream(&stream_path)?;
    let inventory = load_inventory(&inventory_path)?;
    let feed = load_price_feed(&exchange_path)?;
    let market = Market::from_feed(&feed, &run.currency)?;
    let duration = parse_duration(&run.duration, run_file)?;

    Ok(RunSetup {
        description: run.description,
        config_date: date.to_string(),
        catalog,
        stream,
        inventory,
        market,
        duration,
        sourcing: Sourcing {
            inputs: run.sourcing.inputs,
            essentials: run.sourcing.essentials,
            non_essentials: run.sourcing.non_essentials,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("valstream_data_test_{suffix}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("recipes.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("recipes.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("recipes.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("recipes.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("recipes")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn find_data_file_variants() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "sites").unwrap(), None);
        assert!(matches!(
            require_data_file(&dir, "sites"),
            Err(DataLoadError::MissingRequired { .. })
        ));

        fs::write(dir.join("sites.json"), "[]").unwrap();
        assert_eq!(find_data_file(&dir, "sites").unwrap(), Some(dir.join("sites.json")));

        fs::write(dir.join("sites.ron"), "[]").unwrap();
        assert!(matches!(
            find_data_file(&dir, "sites"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn date_substitution() {
        assert_eq!(substitute_date("prices-{date}.json", "20261016"), "prices-20261016.json");
        assert_eq!(substitute_date("fixed.json", "20261016"), "fixed.json");
    }

    #[test]
    fn recipe_list_in_every_format() {
        let dir = make_test_dir("recipes");

        let ron_path = dir.join("a.ron");
        fs::write(
            &ron_path,
            r#"[(id: "FIN.1", line: "FAB", inputs: [("RAW", 10.0)], outputs: [(ticker: "FIN", count: 1.0)], time: "1:0:0:0")]"#,
        )
        .unwrap();
        let json_path = dir.join("b.json");
        fs::write(
            &json_path,
            r#"[{"id": "FIN.1", "line": "FAB", "inputs": [["RAW", 10.0]], "outputs": [{"ticker": "FIN", "count": 1.0}], "time": "24:0:0"}]"#,
        )
        .unwrap();
        let toml_path = dir.join("c.toml");
        fs::write(
            &toml_path,
            r#"
[[recipes]]
id = "FIN.1"
line = "FAB"
inputs = [["RAW", 10.0]]
outputs = [{ ticker = "FIN", count = 1.0 }]
time = "1:0:0:0"
"#,
        )
        .unwrap();

        for path in [&ron_path, &json_path, &toml_path] {
            let recipes: Vec<RecipeData> = deserialize_list(path, |w: TomlRecipes| w.recipes).unwrap();
            assert_eq!(recipes.len(), 1);
            assert_eq!(recipes[0].inputs[0].ticker(), "RAW");
            assert_eq!(recipes[0].inputs[0].count(), 10.0);
            assert_eq!(recipes[0].outputs[0].ticker(), "FIN");
        }

        cleanup(&dir);
    }

    #[test]
    fn parse_error_names_file() {
        let dir = make_test_dir("parse_err");
        let path = dir.join("bad.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();
        let result: Result<Vec<RecipeData>, _> = deserialize_file(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { file, .. }) if file == path));
        cleanup(&dir);
    }

    #[test]
    fn negative_inventory_rejected() {
        let dir = make_test_dir("neg_inv");
        let path = dir.join("inventory.json");
        fs::write(&path, r#"{"RAW": 10.0, "FE": -1.0}"#).unwrap();
        assert!(matches!(load_inventory(&path), Err(DataLoadError::Invalid { .. })));
        cleanup(&dir);
    }

    #[test]
    fn oversized_inventory_rejected() {
        let dir = make_test_dir("big_inv");
        let path = dir.join("inventory.json");
        fs::write(&path, r#"{"RAW": 3000000000.0}"#).unwrap();
        let result = load_inventory(&path);
        assert!(matches!(result, Err(DataLoadError::Invalid { detail, .. }) if detail.contains("out of range")));
        cleanup(&dir);
    }

    fn write_catalog(dir: &Path, recipes: &str, sites: &str) {
        fs::write(dir.join("buildings.json"), r#"[{"ticker": "FAB", "workers": {"PIONEER": 10}}]"#).unwrap();
        fs::write(dir.join("recipes.json"), recipes).unwrap();
        fs::write(dir.join("sites.json"), sites).unwrap();
    }

    const FIN_RECIPE: &str = r#"[{"id": "FIN.1", "line": "FAB", "outputs": [["FIN", 1.0]], "time": "1:0:0"}]"#;

    fn site_with(profile: &str) -> String {
        format!(r#"[{{"name": "Montem", "workers": {{"PIONEER": {profile}}}}}]"#)
    }

    #[test]
    fn oversized_recipe_count_rejected() {
        let dir = make_test_dir("big_recipe");
        write_catalog(
            &dir,
            r#"[{"id": "FIN.1", "line": "FAB", "outputs": [["FIN", 5e9]], "time": "1:0:0"}]"#,
            "[]",
        );
        assert!(matches!(load_catalog(&dir), Err(DataLoadError::Invalid { .. })));
        cleanup(&dir);
    }

    #[test]
    fn need_rate_and_basis_checked() {
        let dir = make_test_dir("needs");

        write_catalog(
            &dir,
            FIN_RECIPE,
            &site_with(r#"{"efficiency": 0.7, "needs": [{"ticker": "DW", "rate": 1e12}]}"#),
        );
        assert!(matches!(load_catalog(&dir), Err(DataLoadError::Invalid { .. })));

        write_catalog(
            &dir,
            FIN_RECIPE,
            &site_with(r#"{"efficiency": 0.7, "needs": [{"ticker": "DW", "rate": 4.0, "basis": 0.0}]}"#),
        );
        assert!(matches!(load_catalog(&dir), Err(DataLoadError::Invalid { detail, .. }) if detail.contains("basis")));

        write_catalog(
            &dir,
            FIN_RECIPE,
            &site_with(r#"{"efficiency": 0.7, "needs": [{"ticker": "DW", "rate": 4.0}]}"#),
        );
        let catalog = load_catalog(&dir).unwrap();
        let need = &catalog.worker_profile("Montem", "PIONEER").unwrap().needs[0];
        assert_eq!(need.rate, 4.0);
        assert_eq!(need.basis, 100.0);

        cleanup(&dir);
    }

    #[test]
    fn worker_efficiency_must_be_a_fraction() {
        let dir = make_test_dir("efficiency");

        write_catalog(&dir, FIN_RECIPE, &site_with(r#"{"efficiency": 1.5}"#));
        assert!(matches!(load_catalog(&dir), Err(DataLoadError::Invalid { detail, .. }) if detail.contains("efficiency")));

        write_catalog(&dir, FIN_RECIPE, &site_with(r#"{"efficiency": -0.1}"#));
        assert!(matches!(load_catalog(&dir), Err(DataLoadError::Invalid { .. })));

        write_catalog(&dir, FIN_RECIPE, &site_with(r#"{"efficiency": 1.0}"#));
        assert_eq!(load_catalog(&dir).unwrap().worker_profile("Montem", "PIONEER").unwrap().efficiency, 1.0);

        cleanup(&dir);
    }

    #[test]
    fn duplicate_names_rejected() {
        let dir = make_test_dir("dupes");
        let path = dir.join("buildings.json");
        fs::write(&path, r#"[{"ticker": "FAB"}, {"ticker": "FAB"}]"#).unwrap();
        let list = deserialize_list(&path, |w: TomlBuildings| w.buildings).unwrap();
        let result = index_by_name(list, |b: &BuildingData| &b.ticker, &path);
        assert!(matches!(result, Err(DataLoadError::DuplicateName { name, .. }) if name == "FAB"));
        cleanup(&dir);
    }

    #[test]
    fn recipe_on_unknown_building_unresolved() {
        let dir = make_test_dir("unresolved");
        fs::write(dir.join("buildings.json"), r#"[{"ticker": "FAB", "workers": {"PIONEER": 10}}]"#).unwrap();
        fs::write(
            dir.join("recipes.json"),
            r#"[{"id": "X.1", "line": "NOPE", "outputs": [["X", 1.0]], "time": "1:0:0"}]"#,
        )
        .unwrap();
        fs::write(dir.join("sites.json"), "[]").unwrap();

        let result = load_catalog(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { expected_kind: "building", .. })
        ));
        cleanup(&dir);
    }
}

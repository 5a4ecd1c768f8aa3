pub mod preprocess;
pub mod query;

use csv::{ ReaderBuilder, StringRecord, WriterBuilder };
use log::{ error, info, warn };
use std::collections::BTreeMap;
use std::path::{ Path, PathBuf };
use thiserror::Error;

use crate::models::laptop::{ Laptop, Persona, SpecRatings };
use self::preprocess::Preprocessor;

pub const COL_BRAND: &str = "Brand";
pub const COL_MODEL_NAME: &str = "Model Name";
pub const COL_PRICE: &str = "Price";
pub const COL_RAM_SIZE: &str = "RAM Size";
pub const COL_GRAPHICS: &str = "Graphics Processor";
pub const COL_DESCRIPTION: &str = "Description";
pub const COL_SPEC_RATINGS: &str = "Specification_Ratings";
pub const COL_PERSONA: &str = "Persona";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file {path} could not be processed: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
    #[error("catalog file {0} was not found")]
    NotFound(String),
}

fn csv_error(path: &Path, source: csv::Error) -> CatalogError {
    CatalogError::Csv {
        path: path.display().to_string(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub raw: PathBuf,
    pub cache: PathBuf,
}

/// The in-memory laptop table.
///
/// A catalog is either loaded (at least one record) or not loaded; query
/// actions check `is_loaded` instead of reaching for a lazily built global.
/// It is never mutated after `initialize` returns.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    laptops: Vec<Laptop>,
    columns: Vec<String>,
    has_personas: bool,
}

impl Catalog {
    pub fn not_loaded() -> Self {
        Self::default()
    }

    pub fn new(laptops: Vec<Laptop>, columns: Vec<String>, has_personas: bool) -> Self {
        Self {
            laptops,
            columns,
            has_personas,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.laptops.is_empty()
    }

    pub fn laptops(&self) -> &[Laptop] {
        &self.laptops
    }

    pub fn len(&self) -> usize {
        self.laptops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laptops.is_empty()
    }

    /// False when the table was loaded from a file without a Persona column.
    pub fn has_personas(&self) -> bool {
        self.has_personas
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Reads the raw catalog. Rows whose price cannot be parsed are dropped.
    pub fn read_raw<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let (headers, rows) = read_rows(path)?;
        require_column(&headers, COL_DESCRIPTION)?;
        require_column(&headers, COL_PRICE)?;

        let total = rows.len();
        let laptops: Vec<Laptop> = rows
            .iter()
            .filter_map(|row| laptop_from_row(&headers, row))
            .collect();
        if laptops.len() < total {
            warn!("Dropped {} row(s) with an unparseable price", total - laptops.len());
        }

        Ok(Self::new(laptops, header_names(&headers), false))
    }

    /// Reads a preprocessed cache, decoding the two structured columns.
    pub fn read_cache<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let (headers, rows) = read_rows(path)?;
        require_column(&headers, COL_PRICE)?;
        let ratings_idx = column_index(&headers, COL_SPEC_RATINGS);
        let persona_idx = column_index(&headers, COL_PERSONA);

        let laptops = rows
            .iter()
            .filter_map(|row| {
                let mut laptop = laptop_from_row(&headers, row)?;
                if let Some(idx) = ratings_idx {
                    laptop.specification_ratings = decode_ratings(row.get(idx).unwrap_or(""));
                }
                if let Some(idx) = persona_idx {
                    laptop.persona = decode_personas(row.get(idx).unwrap_or(""));
                }
                Some(laptop)
            })
            .collect();

        let columns = header_names(&headers)
            .into_iter()
            .filter(|c| c != COL_SPEC_RATINGS && c != COL_PERSONA)
            .collect();
        Ok(Self::new(laptops, columns, persona_idx.is_some()))
    }

    pub fn write_cache<P: AsRef<Path>>(&self, path: P) -> Result<(), CatalogError> {
        let path = path.as_ref();
        let mut writer = WriterBuilder::new().from_path(path).map_err(|e| csv_error(path, e))?;

        let mut header: Vec<&str> = self.columns.iter().map(|c| c.as_str()).collect();
        header.push(COL_SPEC_RATINGS);
        header.push(COL_PERSONA);
        writer.write_record(&header).map_err(|e| csv_error(path, e))?;

        for laptop in &self.laptops {
            let mut record: Vec<String> = self.columns
                .iter()
                .map(|column| cell_value(laptop, column))
                .collect();
            record.push(encode_ratings(laptop.specification_ratings.as_ref()));
            record.push(encode_personas(&laptop.persona));
            writer.write_record(&record).map_err(|e| csv_error(path, e))?;
        }
        writer.flush().map_err(|e| csv_error(path, csv::Error::from(e)))?;
        Ok(())
    }

    pub fn with_laptops(mut self, laptops: Vec<Laptop>, has_personas: bool) -> Self {
        self.laptops = laptops;
        self.has_personas = has_personas;
        self
    }
}

fn read_rows(path: &Path) -> Result<(StringRecord, Vec<StringRecord>), CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.display().to_string()));
    }
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| csv_error(path, e))?;
    Ok((headers, rows))
}

fn header_names(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(|h| h.trim().to_string()).collect()
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn require_column(headers: &StringRecord, name: &'static str) -> Result<(), CatalogError> {
    column_index(headers, name).map(|_| ()).ok_or(CatalogError::MissingColumn(name))
}

/// Strips digit grouping and parses; anything non-finite is rejected.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn laptop_from_row(headers: &StringRecord, row: &StringRecord) -> Option<Laptop> {
    let mut laptop = Laptop {
        brand: None,
        model_name: None,
        price: 0.0,
        ram_size: None,
        graphics_processor: None,
        description: None,
        specification_ratings: None,
        persona: Vec::new(),
        attributes: BTreeMap::new(),
    };
    let mut price = None;

    for (idx, header) in headers.iter().enumerate() {
        let raw = row.get(idx).unwrap_or("");
        match header.trim() {
            COL_BRAND => laptop.brand = non_empty(raw),
            COL_MODEL_NAME => laptop.model_name = non_empty(raw),
            COL_PRICE => price = parse_price(raw),
            COL_RAM_SIZE => laptop.ram_size = non_empty(raw),
            COL_GRAPHICS => laptop.graphics_processor = non_empty(raw),
            COL_DESCRIPTION => laptop.description = non_empty(raw),
            COL_SPEC_RATINGS | COL_PERSONA => {}
            other => {
                laptop.attributes.insert(other.to_string(), non_empty(raw));
            }
        }
    }

    laptop.price = price?;
    Some(laptop)
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        price.to_string()
    }
}

fn cell_value(laptop: &Laptop, column: &str) -> String {
    let value = match column {
        COL_BRAND => laptop.brand.clone(),
        COL_MODEL_NAME => laptop.model_name.clone(),
        COL_PRICE => Some(format_price(laptop.price)),
        COL_RAM_SIZE => laptop.ram_size.clone(),
        COL_GRAPHICS => laptop.graphics_processor.clone(),
        COL_DESCRIPTION => laptop.description.clone(),
        other => laptop.attributes.get(other).cloned().flatten(),
    };
    value.unwrap_or_default()
}

/// Accepts both JSON and the single-quoted literal form older caches used.
fn normalise_literal(raw: &str) -> String {
    raw.replace('\'', "\"")
        .replace("None", "null")
        .replace("True", "true")
        .replace("False", "false")
}

fn decode_cell<T: serde::de::DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json
        ::from_str(trimmed)
        .or_else(|_| serde_json::from_str(&normalise_literal(trimmed)))
        .ok()
}

pub fn encode_ratings(ratings: Option<&SpecRatings>) -> String {
    ratings
        .and_then(|r| serde_json::to_string(r).ok())
        .unwrap_or_else(|| "{}".to_string())
}

/// `None` stands for the empty `{}` value, including on any decode failure.
pub fn decode_ratings(raw: &str) -> Option<SpecRatings> {
    decode_cell(raw)
}

pub fn encode_personas(personas: &[Persona]) -> String {
    serde_json::to_string(personas).unwrap_or_else(|_| "[]".to_string())
}

pub fn decode_personas(raw: &str) -> Vec<Persona> {
    decode_cell::<Vec<String>>(raw)
        .unwrap_or_default()
        .iter()
        .filter_map(|label| label.parse().ok())
        .collect()
}

/// Builds the catalog for this run: the cache when present (unless
/// `force_reprocess`), otherwise the raw file run through `preprocessor` and
/// written back to the cache. Any load failure yields a not-loaded catalog.
pub async fn initialize(
    paths: &CatalogPaths,
    force_reprocess: bool,
    preprocessor: &Preprocessor
) -> Catalog {
    if !force_reprocess && paths.cache.exists() {
        info!("Loading preprocessed data from {}...", paths.cache.display());
        match Catalog::read_cache(&paths.cache) {
            Ok(catalog) => {
                info!("Loaded {} preprocessed laptops.", catalog.len());
                return catalog;
            }
            Err(e) => {
                error!("Failed to load preprocessed data: {}", e);
                return Catalog::not_loaded();
            }
        }
    }

    info!("Preprocessing data from {}...", paths.raw.display());
    let raw = match Catalog::read_raw(&paths.raw) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Cannot proceed with preprocessing: {}", e);
            return Catalog::not_loaded();
        }
    };

    info!("Generating Specification_Ratings and Persona tags for {} laptops (this may take a while)...", raw.len());
    let enriched = preprocessor.enrich(raw.laptops().to_vec()).await;
    let catalog = raw.with_laptops(enriched, true);

    match catalog.write_cache(&paths.cache) {
        Ok(()) => info!("Preprocessed data saved to {}", paths.cache.display()),
        Err(e) => error!("Error saving preprocessed data: {}", e),
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::laptop::Rating;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn price_parsing_handles_grouping() {
        assert_eq!(parse_price("35,990"), Some(35990.0));
        assert_eq!(parse_price(" 1,20,000 "), Some(120000.0));
        assert_eq!(parse_price("49999.5"), Some(49999.5));
        assert_eq!(parse_price("N/A"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("inf"), None);
    }

    #[test]
    fn raw_rows_with_bad_price_are_dropped() {
        let file = write_csv(
            "Brand,Model Name,Price,Laptop Weight,Description\n\
             Dell,Inspiron,\"35,990\",2.5 kg,Budget laptop\n\
             HP,Pavilion,call us,1.8 kg,Mid range\n\
             Asus,ROG,\"1,20,000\",,Gaming beast\n"
        );
        let catalog = Catalog::read_raw(file.path()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.laptops()[0].price, 35990.0);
        assert_eq!(catalog.laptops()[0].attributes["Laptop Weight"].as_deref(), Some("2.5 kg"));
        assert_eq!(catalog.laptops()[1].model_name.as_deref(), Some("ROG"));
        assert_eq!(catalog.laptops()[1].attributes["Laptop Weight"], None);
        assert!(!catalog.has_personas());
    }

    #[test]
    fn blank_description_counts_as_missing() {
        let file = write_csv(
            "Model Name,Price,Description\n\
             Inspiron,100,\"   \"\n\
             Pavilion,200,\n"
        );
        let catalog = Catalog::read_raw(file.path()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.laptops().iter().all(|l| l.description.is_none()));
    }

    #[test]
    fn raw_file_without_description_is_rejected() {
        let file = write_csv("Brand,Price\nDell,100\n");
        let err = Catalog::read_raw(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn(COL_DESCRIPTION)));
    }

    #[test]
    fn missing_raw_file_is_not_found() {
        let err = Catalog::read_raw("definitely/missing.csv").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn cache_round_trips_structured_columns() {
        let raw = write_csv("Brand,Model Name,Price,Description\nDell,Inspiron,\"35,990\",Budget\nHP,Envy,70000,\n");
        let base = Catalog::read_raw(raw.path()).unwrap();
        let mut laptops = base.laptops().to_vec();
        laptops[0].specification_ratings = Some(SpecRatings {
            gpu_intensity: Rating::Low,
            display_quality: Rating::Medium,
            portability: Rating::Medium,
            multitasking: Rating::Low,
            processing_speed: Rating::Medium,
        });
        laptops[0].persona = vec![Persona::Student, Persona::BudgetConscious];
        let catalog = base.with_laptops(laptops.clone(), true);

        let cache = NamedTempFile::new().unwrap();
        catalog.write_cache(cache.path()).unwrap();
        let reloaded = Catalog::read_cache(cache.path()).unwrap();

        assert_eq!(reloaded.laptops(), laptops.as_slice());
        assert!(reloaded.has_personas());
        assert_eq!(reloaded.columns(), catalog.columns());
    }

    #[test]
    fn corrupt_cache_cells_default_to_empty() {
        let file = write_csv(
            "Model Name,Price,Specification_Ratings,Persona\n\
             Inspiron,100,{broken,not a list\n"
        );
        let catalog = Catalog::read_cache(file.path()).unwrap();
        let laptop = &catalog.laptops()[0];
        assert_eq!(laptop.specification_ratings, None);
        assert!(laptop.persona.is_empty());
    }

    #[test]
    fn legacy_literal_cells_are_accepted() {
        assert_eq!(decode_personas("['gamer', 'Developer']"), vec![Persona::Gamer, Persona::Developer]);
        let ratings = decode_ratings(
            "{'GPU intensity': 'high', 'Display quality': 'high', 'Portability': 'low', 'Multitasking': 'high', 'Processing speed': 'high'}"
        ).unwrap();
        assert_eq!(ratings.portability, Rating::Low);
        assert_eq!(decode_ratings("{}"), None);
    }

    #[test]
    fn cache_without_persona_column_is_flagged() {
        let file = write_csv("Model Name,Price\nInspiron,100\n");
        let catalog = Catalog::read_cache(file.path()).unwrap();
        assert!(catalog.is_loaded());
        assert!(!catalog.has_personas());
    }
}

//! Population series and dataset loading
//!
//! The loader keeps census cells as raw strings so that a bad value only
//! affects its own entity: parsing happens later, per entity, in
//! [`EntityRecord::normalize`].

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One census observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub year: i32,
    pub population: u64,
}

impl Observation {
    pub fn new(year: i32, population: u64) -> Self {
        Self { year, population }
    }
}

/// Census observations of one entity, ordered by strictly increasing year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationSeries {
    entity: String,
    observations: Vec<Observation>,
}

impl PopulationSeries {
    /// Create a series from observations that are already in year order
    pub fn new(entity: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
        let entity = entity.into();
        if let Some(pair) = observations.windows(2).find(|w| w[1].year <= w[0].year) {
            return Err(ForecastError::MalformedSeries {
                entity,
                reason: format!(
                    "years must be strictly increasing, found {} after {}",
                    pair[1].year, pair[0].year
                ),
            });
        }

        Ok(Self {
            entity,
            observations,
        })
    }

    /// Build a series from `(year label, count)` cells in any order.
    ///
    /// The year is the leading whitespace-delimited token of the label, so
    /// `"1970"` and `"1970 Population"` both name 1970.
    pub fn from_labeled<I, L, C>(entity: &str, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, C)>,
        L: AsRef<str>,
        C: AsRef<str>,
    {
        let malformed = |reason: String| ForecastError::MalformedSeries {
            entity: entity.to_string(),
            reason,
        };

        let mut observations = cells
            .into_iter()
            .map(|(label, count)| {
                let label = label.as_ref();
                let count = count.as_ref();
                let year = parse_year(label)
                    .ok_or_else(|| malformed(format!("cannot parse a year from '{}'", label)))?;
                let population = count.trim().parse::<u64>().map_err(|_| {
                    malformed(format!(
                        "count '{}' for {} is not a non-negative integer",
                        count, year
                    ))
                })?;
                Ok::<_, ForecastError>(Observation::new(year, population))
            })
            .collect::<Result<Vec<_>>>()?;

        observations.sort_by_key(|o| o.year);
        if let Some(pair) = observations.windows(2).find(|w| w[0].year == w[1].year) {
            return Err(malformed(format!(
                "year {} appears more than once",
                pair[0].year
            )));
        }

        Self::new(entity, observations)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.observations.iter().map(|o| o.year).collect()
    }

    /// Population counts as floats, for model fitting
    pub fn values(&self) -> Vec<f64> {
        to_values(&self.observations)
    }

    /// Most recent observation
    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }
}

/// Population counts of a slice of observations as floats
pub fn to_values(observations: &[Observation]) -> Vec<f64> {
    observations.iter().map(|o| o.population as f64).collect()
}

/// Parse the year from a column label such as `"2022 Population"`
pub fn parse_year(label: &str) -> Option<i32> {
    label.split_whitespace().next()?.parse().ok()
}

/// One dataset row: an entity id plus its raw census cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub id: String,
    pub name: Option<String>,
    /// `(column label, raw cell)` pairs, one per census year
    pub cells: Vec<(String, String)>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, cells: Vec<(String, String)>) -> Self {
        Self {
            id: id.into(),
            name: None,
            cells,
        }
    }

    /// Record from numeric observations, handy for synthetic data
    pub fn from_counts(id: impl Into<String>, years: &[i32], counts: &[u64]) -> Self {
        let cells = years
            .iter()
            .zip(counts)
            .map(|(year, count)| (year.to_string(), count.to_string()))
            .collect();
        Self::new(id, cells)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse the raw cells into a [`PopulationSeries`]
    pub fn normalize(&self) -> Result<PopulationSeries> {
        PopulationSeries::from_labeled(
            &self.id,
            self.cells.iter().map(|(label, cell)| (label, cell)),
        )
    }
}

/// Column layout of the input CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Column holding the unique entity identifier
    pub id_column: String,
    /// Optional column holding a display name
    pub name_column: Option<String>,
    /// Suffix after the year in census column headers
    pub year_suffix: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            id_column: "CCA3".to_string(),
            name_column: Some("Country/Territory".to_string()),
            year_suffix: " Population".to_string(),
        }
    }
}

/// Data loader for wide census tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load entity records from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<Vec<EntityRecord>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let records = Self::from_reader(file, config)?;
        info!(
            "Loaded {} entities from {}",
            records.len(),
            path.display()
        );
        Ok(records)
    }

    /// Load entity records from any CSV source
    pub fn from_reader<R: Read>(reader: R, config: &LoaderConfig) -> Result<Vec<EntityRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let id_idx = Self::find_column(&headers, &config.id_column).ok_or_else(|| {
            ForecastError::DataError(format!("No '{}' column found in data", config.id_column))
        })?;
        let name_idx = config
            .name_column
            .as_deref()
            .and_then(|name| Self::find_column(&headers, name));
        let year_columns = Self::detect_year_columns(&headers, config);
        if year_columns.is_empty() {
            return Err(ForecastError::DataError(
                "No census year columns found in data".to_string(),
            ));
        }
        debug!(
            "Detected {} census columns: {:?}",
            year_columns.len(),
            year_columns.iter().map(|(_, label)| label).collect::<Vec<_>>()
        );

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let id = record.get(id_idx).unwrap_or("").trim().to_string();
            if id.is_empty() {
                return Err(ForecastError::DataError(format!(
                    "Row {} has an empty '{}' value",
                    row + 1,
                    config.id_column
                )));
            }
            if !seen.insert(id.clone()) {
                return Err(ForecastError::DataError(format!(
                    "Entity '{}' appears more than once",
                    id
                )));
            }

            let cells = year_columns
                .iter()
                .map(|(idx, label)| (label.clone(), record.get(*idx).unwrap_or("").to_string()))
                .collect();
            let mut entity = EntityRecord::new(id, cells);
            if let Some(name) = name_idx.and_then(|idx| record.get(idx)) {
                entity = entity.with_name(name.trim());
            }
            records.push(entity);
        }

        Ok(records)
    }

    fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
        headers.iter().position(|h| h == name)
    }

    /// Columns named `<YYYY><suffix>` or just `<YYYY>`
    fn detect_year_columns(headers: &csv::StringRecord, config: &LoaderConfig) -> Vec<(usize, String)> {
        let is_year = |s: &str| s.len() == 4 && s.chars().all(|c| c.is_ascii_digit());

        headers
            .iter()
            .enumerate()
            .filter(|(_, header)| {
                let header: &str = header;
                let stripped = if config.year_suffix.is_empty() {
                    None
                } else {
                    header.strip_suffix(config.year_suffix.as_str())
                };
                stripped.map_or(false, is_year) || is_year(header)
            })
            .map(|(idx, header)| (idx, header.to_string()))
            .collect()
    }
}

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

const CONTRACT_TYPES: [&str; 2] = ["contracting", "employee_leasing"];
const DACH_COUNTRIES: [&str; 3] = ["1", "2", "3"];

/// One independently tracked search. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchConfiguration {
    pub name: String,
    pub query: String,
    pub location: LocationFilter,
    /// Restrict results to Germany, Austria and Switzerland.
    #[serde(default)]
    pub dach: bool,
    #[serde(default)]
    pub city: Option<CityFilter>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFilter {
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub hybrid: bool,
    #[serde(default)]
    pub on_site: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CityFilter {
    pub name: String,
    /// Radius in kilometres, passed to the source verbatim.
    pub radius: String,
}

impl FetchConfiguration {
    /// Query parameters for the project search, in the order the source expects.
    /// Array values expand to `key[index]`.
    pub fn search_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        push_array(&mut params, "projectContractTypes", &CONTRACT_TYPES);

        let mut remote_in_percent = Vec::new();
        if self.location.remote {
            remote_in_percent.push("100");
        }
        if self.location.hybrid {
            remote_in_percent.push("1");
        }
        if self.location.on_site {
            remote_in_percent.push("0");
        }
        push_array(&mut params, "remoteInPercent", &remote_in_percent);

        params.push(("query".to_string(), self.query.clone()));

        if self.dach {
            push_array(&mut params, "countries", &DACH_COUNTRIES);
        }

        params.push(("sort".to_string(), "1".to_string()));
        params.push(("pagenr".to_string(), "1".to_string()));

        if let Some(city) = &self.city {
            params.push(("city".to_string(), city.name.clone()));
            params.push(("radius".to_string(), city.radius.clone()));
        }

        params
    }
}

fn push_array(params: &mut Vec<(String, String)>, key: &str, values: &[&str]) {
    for (index, value) in values.iter().enumerate() {
        params.push((format!("{key}[{index}]"), (*value).to_string()));
    }
}

/// Read and validate the fetcher file. Any malformed entry fails the whole load.
pub fn load_fetch_configurations(path: &Path) -> Result<Vec<FetchConfiguration>, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read {}: {e}", path.display())))?;
    parse_fetch_configurations(&raw)
        .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
}

pub fn parse_fetch_configurations(raw: &str) -> Result<Vec<FetchConfiguration>, AppError> {
    let configs: Vec<FetchConfiguration> = serde_json::from_str(raw)
        .map_err(|e| AppError::Config(format!("Malformed fetcher configuration: {e}")))?;

    if configs.is_empty() {
        return Err(AppError::Config("No fetchers configured".to_string()));
    }

    let mut seen = HashSet::new();
    for (index, config) in configs.iter().enumerate() {
        if config.name.trim().is_empty() {
            return Err(AppError::Config(format!("Fetcher #{index} has an empty name")));
        }
        if !seen.insert(config.name.as_str()) {
            return Err(AppError::Config(format!(
                "Duplicate fetcher name '{}'",
                config.name
            )));
        }
        if let Some(city) = &config.city
            && city.name.trim().is_empty()
        {
            return Err(AppError::Config(format!(
                "Fetcher '{}' has a city filter without a city name",
                config.name
            )));
        }
    }

    Ok(configs)
}

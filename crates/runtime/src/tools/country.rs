//! Country lookup backed by the restcountries.com API.

use super::{Capability, ToolError};
use crate::model::ToolSpec;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

pub const COUNTRY_TOOL_NAME: &str = "get_country_info";
pub const DEFAULT_COUNTRY_API: &str = "https://restcountries.com/v3.1";

#[derive(Debug, Deserialize)]
struct CountryRecord {
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    population: Option<u64>,
}

/// Looks up a country's capital and population by name.
#[derive(Debug, Clone)]
pub struct CountryInfo {
    client: reqwest::Client,
    base_url: String,
}

impl CountryInfo {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Contract offered to the model.
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            COUNTRY_TOOL_NAME,
            "Look up a country by its English or official name and return details \
             such as its capital and population.",
            json!({
                "type": "object",
                "properties": {
                    "country_name": {
                        "type": "string",
                        "description": "English name of the country, e.g. Germany, France, Japan"
                    }
                },
                "required": ["country_name"]
            }),
        )
    }
}

#[async_trait]
impl Capability for CountryInfo {
    async fn invoke(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let country = arguments
            .get("country_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ToolError::invocation(format!("invalid country api url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ToolError::invocation("country api url cannot take a path"))?
            .pop_if_empty()
            .push("name")
            .push(country);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::invocation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolError::invocation(format!(
                "country lookup for {country} returned {}",
                response.status()
            )));
        }

        let records: Vec<CountryRecord> = response
            .json()
            .await
            .map_err(|e| ToolError::invocation(format!("malformed country response: {e}")))?;

        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::invocation(format!("no country matches {country}")))?;

        Ok(json!({
            "capital": record.capital.into_iter().next(),
            "population": record.population,
        }))
    }
}

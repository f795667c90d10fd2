//! Wire models for the Azure identity, resources and Monitor endpoints.

use serde::{Deserialize, Deserializer};

/// Body returned by the client-credentials token endpoint.
///
/// Every field is required and must be a JSON string; `expires_on` carries
/// epoch seconds as a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub resource: String,
    pub expires_on: String,
}

/// A monitored resource as returned by the resource listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

#[cfg(test)]
impl ResourceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type: resource_type.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceListResponse {
    #[serde(default)]
    pub value: Vec<ResourceDescriptor>,
}

/// Value plus its display form, as used by Monitor for names
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedName {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub localized_value: String,
}

/// One metric available on a resource
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    #[serde(default)]
    pub name: LocalizedName,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub primary_aggregation_type: Option<String>,
}

#[cfg(test)]
impl MetricDefinition {
    /// Definition carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: LocalizedName {
                value: name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricDefinitionResponse {
    #[serde(default)]
    pub value: Vec<MetricDefinition>,
}

/// A single aggregated observation. Aggregates not requested are absent and read as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    #[serde(default)]
    pub time_stamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub average: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub minimum: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub maximum: f64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeries {
    #[serde(default)]
    pub data: Vec<DataPoint>,
}

/// Values of one metric on one resource
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricValue {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: LocalizedName,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub timeseries: Vec<TimeSeries>,
}

impl MetricValue {
    /// Most recent point of the first series, if any
    pub fn latest_point(&self) -> Option<&DataPoint> {
        self.timeseries.first().and_then(|series| series.data.last())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricValueResponse {
    #[serde(default)]
    pub value: Vec<MetricValue>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

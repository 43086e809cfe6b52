use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AnalysisInputs
// ---------------------------------------------------------------------------

/// Calculator inputs submitted with an analysis.
///
/// Every field is optional; absent fields are not written to the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInputs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_rental_income: Option<f64>,
    /// Percent per year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_rent_increase: Option<f64>,
    /// Months per year the property is expected to stand empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_months: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rates: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_levies: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_insurance: Option<f64>,
    /// Percent of rent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_percent: Option<f64>,
    /// Percent of rent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_percent: Option<f64>,
    /// Percent of rent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_water_elec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_wifi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_security: Option<f64>,
    /// Percent per year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_expense_increase: Option<f64>,
    /// Bond term in years.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term: Option<f64>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// One stored analysis, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Partition key: a random UUID v4.
    pub id: String,

    /// RFC 3339 timestamp of when the analysis was received.
    pub created_at: String,

    #[serde(flatten)]
    pub inputs: AnalysisInputs,
}

impl Analysis {
    /// Create a record for `inputs` with a fresh id, stamped now.
    pub fn new(inputs: AnalysisInputs) -> Self {
        Self::with_id(Uuid::new_v4(), Utc::now(), inputs)
    }

    /// Create a record with an explicit id and timestamp.
    pub fn with_id(id: Uuid, created_at: DateTime<Utc>, inputs: AnalysisInputs) -> Self {
        Self {
            id: id.to_string(),
            created_at: created_at.to_rfc3339(),
            inputs,
        }
    }
}

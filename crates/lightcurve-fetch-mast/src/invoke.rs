use lightcurve_fetch::TargetId;
use serde::Deserialize;
use serde_json::{Value, json};

/// Envelope returned by MAST's invoke API.
/// `POST /api/v0/invoke` with form field `request=<json>`
#[derive(Debug, Deserialize)]
pub struct InvokeResponse<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One row from `Mast.Caom.Filtered`.
#[derive(Debug, Deserialize)]
pub struct Observation {
    pub obsid: Value,
    #[serde(default)]
    pub obs_id: Option<String>,
    #[serde(default)]
    pub target_name: Option<String>,
}

impl Observation {
    /// MAST sends `obsid` as either a string or a number.
    pub fn obsid(&self) -> Option<String> {
        match &self.obsid {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// One row from `Mast.Caom.Products`.
#[derive(Debug, Deserialize)]
pub struct Product {
    #[serde(rename = "dataURI")]
    pub data_uri: String,
    #[serde(rename = "productFilename", default)]
    pub filename: Option<String>,
    #[serde(rename = "productSubGroupDescription", default)]
    pub sub_group: Option<String>,
    #[serde(rename = "productType", default)]
    pub product_type: Option<String>,
}

impl Product {
    /// True for a science light-curve file (long or short cadence).
    pub fn is_light_curve(&self) -> bool {
        if let Some(kind) = &self.product_type
            && !kind.eq_ignore_ascii_case("SCIENCE")
        {
            return false;
        }

        let by_group = self
            .sub_group
            .as_deref()
            .is_some_and(|g| matches!(g, "LLC" | "SLC" | "LC"));
        let by_name = self
            .filename
            .as_deref()
            .is_some_and(|f| f.ends_with("lc.fits"));

        by_group || by_name
    }
}

/// Archive-side target name for an identifier. Kepler and K2 names are
/// zero-padded to nine digits.
pub fn target_name(mission: &str, target: &TargetId) -> String {
    match (mission.to_ascii_lowercase().as_str(), target.kic_number()) {
        ("kepler", Some(n)) => format!("kplr{n:09}"),
        ("k2", Some(n)) => format!("ktwo{n:09}"),
        _ => target.to_string(),
    }
}

pub fn search_request(mission: &str, target_name: &str) -> Value {
    json!({
        "service": "Mast.Caom.Filtered",
        "format": "json",
        "params": {
            "columns": "*",
            "filters": [
                { "paramName": "obs_collection", "values": [mission] },
                { "paramName": "dataproduct_type", "values": ["timeseries"] },
                { "paramName": "target_name", "values": [target_name] },
            ],
        },
    })
}

pub fn products_request(obsid: &str) -> Value {
    json!({
        "service": "Mast.Caom.Products",
        "format": "json",
        "params": { "obsid": obsid },
    })
}

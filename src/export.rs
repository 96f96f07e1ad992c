use serde::{Deserialize, Serialize};

use crate::Client;
use crate::error::Result;
use crate::util::{is_zero_f64, is_zero_i64, null_as_default};

/// An export as listed in an AOI's `export_set`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Export {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub datatype: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub hsrs: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub started_at: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub user: i64,
}

/// A downloadable file produced by an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFile {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub datatype: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub url: String,
}

/// Terrain-derived analysis product attached to an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tda {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub tda_type: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub url: String,
}

/// Response of `GET api/v2/export/{pk}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDetail {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub datatype: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub hsrs: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub started_at: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub user: i64,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "null_as_default")]
    pub rgb: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "null_as_default")]
    pub intensity: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "null_as_default")]
    pub dim_classification: bool,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub file_export_options: String,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "null_as_default")]
    pub generate_dem: bool,
    #[serde(skip_serializing_if = "is_zero_f64", deserialize_with = "null_as_default")]
    pub cell_spacing: f64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub classification: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub pcl_terrain: String,
    #[serde(skip_serializing_if = "is_zero_f64", deserialize_with = "null_as_default")]
    pub sri_hres: f64,
    #[serde(rename = "exportfiles", skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub export_files: Vec<ExportFile>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub tda_set: Vec<Tda>,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub task_id: String,
}

/// Export endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Exports<'a> {
    client: &'a Client,
}

impl<'a> Exports<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `GET api/v2/export/{pk}`
    pub fn get(&self, pk: i64) -> Result<ExportDetail> {
        self.client.get_json(&format!("api/v2/export/{pk}"))
    }
}

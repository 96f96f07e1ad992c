use serde::{Deserialize, Serialize};

use crate::Client;
use crate::error::Result;
use crate::util::{null_as_default, require, with_query};

/// Suggested place name for a geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geoname {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(alias = "provided_geometry", skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub geom: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Geonames<'a> {
    client: &'a Client,
}

impl<'a> Geonames<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Looks up the suggested AOI name for a WKT geometry.
    pub fn lookup(&self, geom: &str) -> Result<Geoname> {
        require(geom, "Please provide a WKT geometry string")?;
        let path = with_query("api/v2/geoname", &[("geom", geom.trim().to_string())]);
        self.client.get_json(&path)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Client;
use crate::error::{GridError, Result};
use crate::export::Export;
use crate::util::{is_zero_f64, is_zero_i64, null_as_default, py_bool, require, with_query};

/// One entry of the AOI list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiSummary {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub user: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub geometry: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
}

/// Response of `GET api/v2/aoi`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiList {
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub aoi_list: Vec<AoiSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointcloudDataset {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub datatype: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub sensor: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub collected_at: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub classification: String,
    #[serde(skip_serializing_if = "is_zero_f64", deserialize_with = "null_as_default")]
    pub area: f64,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub filesize: i64,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub point_count: i64,
    #[serde(skip_serializing_if = "is_zero_f64", deserialize_with = "null_as_default")]
    pub density: f64,
    #[serde(skip_serializing_if = "is_zero_f64", deserialize_with = "null_as_default")]
    pub percent_coverage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterDataset {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub datatype: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub sensor: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub collected_at: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub classification: String,
    #[serde(skip_serializing_if = "is_zero_f64", deserialize_with = "null_as_default")]
    pub area: f64,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub filesize: i64,
    #[serde(skip_serializing_if = "is_zero_f64", deserialize_with = "null_as_default")]
    pub percent_coverage: f64,
}

/// Response of `GET api/v2/aoi/{pk}` and of the add endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoiDetail {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub user: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub geometry: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub pk: i64,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub export_set: Vec<Export>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub pointcloud_intersects: Vec<PointcloudDataset>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub raster_intersects: Vec<RasterDataset>,
}

/// Response of the generate-export endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedExport {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub task_id: String,
    #[serde(skip_serializing_if = "is_zero_i64", deserialize_with = "null_as_default")]
    pub export_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    Urban,
    Mountainous,
    Suburban,
    Foliated,
}

impl Terrain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urban => "urban",
            Self::Mountainous => "mountainous",
            Self::Suburban => "suburban",
            Self::Foliated => "foliated",
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Terrain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urban" => Ok(Self::Urban),
            "mountainous" => Ok(Self::Mountainous),
            "suburban" => Ok(Self::Suburban),
            "foliated" => Ok(Self::Foliated),
            other => Err(format!(
                "unknown terrain {other:?} (expected urban, mountainous, suburban or foliated)"
            )),
        }
    }
}

/// How exported files are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileExportMode {
    /// One file per input tile.
    #[default]
    Individual,
    /// One file per collect.
    Collect,
}

impl FileExportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Collect => "collect",
        }
    }
}

impl FromStr for FileExportMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "collect" => Ok(Self::Collect),
            other => Err(format!(
                "unknown file export mode {other:?} (expected individual or collect)"
            )),
        }
    }
}

/// Options for a point-cloud export. [`Default`] matches the server's defaults,
/// and only values that differ from them are sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PointcloudExportOptions {
    pub intensity: bool,
    pub dim_classification: bool,
    /// Horizontal spatial reference, as an EPSG code.
    pub hsrs: Option<String>,
    pub file_export_options: FileExportMode,
    pub file_export_format: String,
    pub compressed: bool,
    pub send_email: bool,
    pub generate_dem: bool,
    /// DEM cell spacing; only sent with `generate_dem`.
    pub cell_spacing: f64,
    pub pcl_terrain: Option<Terrain>,
    /// Horizontal resolution.
    pub sri_hres: Option<f64>,
    pub decimation_radius: Option<f64>,
    pub retile_size: Option<f64>,
    pub retile_area: Option<f64>,
}

impl Default for PointcloudExportOptions {
    fn default() -> Self {
        Self {
            intensity: true,
            dim_classification: true,
            hsrs: None,
            file_export_options: FileExportMode::Individual,
            file_export_format: "las12".to_string(),
            compressed: true,
            send_email: false,
            generate_dem: false,
            cell_spacing: 1.0,
            pcl_terrain: None,
            sri_hres: None,
            decimation_radius: None,
            retile_size: None,
            retile_area: None,
        }
    }
}

impl PointcloudExportOptions {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if !self.compressed {
            q.push(("compressed", py_bool(false)));
        }
        if !self.dim_classification {
            q.push(("dim_classification", py_bool(false)));
        }
        q.push(("file_export_options", self.file_export_options.as_str().to_string()));
        if !self.file_export_format.trim().is_empty() {
            q.push(("file_export_format", self.file_export_format.trim().to_string()));
        }
        if self.generate_dem {
            q.push(("generate_dem", py_bool(true)));
            if self.cell_spacing != 1.0 {
                q.push(("cell_spacing", self.cell_spacing.to_string()));
            }
        }
        if let Some(hsrs) = self.hsrs.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            q.push(("hsrs", hsrs.to_string()));
        }
        if !self.intensity {
            q.push(("intensity", py_bool(false)));
        }
        if let Some(terrain) = self.pcl_terrain {
            q.push(("pcl_terrain", terrain.as_str().to_string()));
        }
        if self.send_email {
            q.push(("send_email", py_bool(true)));
        }
        for (name, value) in [
            ("sri_hres", self.sri_hres),
            ("decimation_radius", self.decimation_radius),
            ("retile_size", self.retile_size),
            ("retile_area", self.retile_area),
        ] {
            if let Some(v) = value.filter(|v| *v != 0.0) {
                q.push((name, v.to_string()));
            }
        }
        q
    }
}

/// AOI endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Aois<'a> {
    client: &'a Client,
}

impl<'a> Aois<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// All of the user's AOIs, optionally only those intersecting `geom` (WKT).
    pub fn list(&self, geom: Option<&str>) -> Result<AoiList> {
        let mut query = Vec::new();
        if let Some(geom) = geom.map(str::trim).filter(|g| !g.is_empty()) {
            query.push(("geom", geom.to_string()));
        }
        self.client.get_json(&with_query("api/v2/aoi", &query))
    }

    pub fn get(&self, pk: i64) -> Result<AoiDetail> {
        self.client.get_json(&format!("api/v2/aoi/{pk}"))
    }

    /// Creates an AOI named `name` covering the WKT `geom`.
    pub fn add(&self, name: &str, geom: &str, subscribe: bool) -> Result<AoiDetail> {
        require(name, "Please provide an AOI name and WKT geometry string")?;
        require(geom, "Please provide a WKT geometry string")?;

        let mut query = vec![("geom", geom.trim().to_string()), ("name", name.trim().to_string())];
        if subscribe {
            query.push(("subscribe", py_bool(true)));
        }
        self.client.get_json(&with_query("api/v2/aoi/add", &query))
    }

    /// Starts a point-cloud export of `products` (collect names) within AOI `pk`.
    pub fn generate_pointcloud_export(
        &self,
        pk: i64,
        products: &[String],
        options: &PointcloudExportOptions,
    ) -> Result<GeneratedExport> {
        let products: Vec<&str> = products
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if products.is_empty() {
            return Err(GridError::validation("Please provide at least one collect to export"));
        }

        let mut query: Vec<(&str, String)> =
            products.iter().map(|p| ("products", p.to_string())).collect();
        query.extend(options.query_pairs());

        let path = with_query(&format!("api/v2/aoi/{pk}/generate/pointcloud"), &query);
        self.client.get_json(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_for, mock_server, unreachable_client};

    #[test]
    fn default_options_send_only_mode_and_format() {
        let q = PointcloudExportOptions::default().query_pairs();
        assert_eq!(
            q,
            vec![
                ("file_export_options", "individual".to_string()),
                ("file_export_format", "las12".to_string()),
            ]
        );
    }

    #[test]
    fn non_default_options_are_emitted() {
        let options = PointcloudExportOptions {
            compressed: false,
            intensity: false,
            generate_dem: true,
            cell_spacing: 2.5,
            pcl_terrain: Some(Terrain::Urban),
            sri_hres: Some(0.5),
            retile_size: Some(0.0),
            send_email: true,
            ..PointcloudExportOptions::default()
        };
        let q = options.query_pairs();
        assert!(q.contains(&("compressed", "False".to_string())));
        assert!(q.contains(&("intensity", "False".to_string())));
        assert!(q.contains(&("generate_dem", "True".to_string())));
        assert!(q.contains(&("cell_spacing", "2.5".to_string())));
        assert!(q.contains(&("pcl_terrain", "urban".to_string())));
        assert!(q.contains(&("sri_hres", "0.5".to_string())));
        assert!(q.contains(&("send_email", "True".to_string())));
        assert!(!q.iter().any(|(k, _)| *k == "retile_size"));
    }

    #[test]
    fn cell_spacing_requires_dem() {
        let options = PointcloudExportOptions {
            cell_spacing: 3.0,
            ..PointcloudExportOptions::default()
        };
        assert!(!options.query_pairs().iter().any(|(k, _)| *k == "cell_spacing"));
    }

    #[test]
    fn terrain_parses_case_insensitively() {
        assert_eq!("Foliated".parse::<Terrain>(), Ok(Terrain::Foliated));
        assert!("swamp".parse::<Terrain>().is_err());
    }

    #[test]
    fn add_with_empty_geometry_fails_before_sending() {
        let client = unreachable_client();
        let err = client.aois().add("Denver", "   ", true).expect_err("must fail");
        assert!(matches!(err, GridError::Validation(_)), "{err:?}");
    }

    #[test]
    fn add_with_empty_name_fails_before_sending() {
        let server = mock_server();
        let mock = server.mock(|when, then| {
            when.path("/api/v2/aoi/add");
            then.status(200).body("{}");
        });

        let err = client_for(&server)
            .aois()
            .add("", "POLYGON ((0 0, 1 0, 1 1, 0 0))", false)
            .expect_err("must fail");
        assert!(matches!(err, GridError::Validation(_)));
        mock.assert_calls(0);
    }

    #[test]
    fn add_sends_geometry_name_and_subscribe() -> Result<()> {
        let geom = "POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10))";
        let server = mock_server();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/api/v2/aoi/add")
                .query_param("geom", geom)
                .query_param("name", "Denver")
                .query_param("subscribe", "True")
                .query_param("source", "KEY")
                .header("authorization", "Basic YTpi");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"name":"Denver","pk":12,"created_at":"2016-05-01T00:00:00Z"}"#);
        });

        let aoi = client_for(&server).aois().add("Denver", geom, true)?;
        mock.assert();
        assert_eq!(aoi.pk, 12);
        assert_eq!(aoi.name, "Denver");
        Ok(())
    }

    #[test]
    fn list_passes_geometry_filter() -> Result<()> {
        let server = mock_server();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/api/v2/aoi").query_param("geom", "POINT (1 2)");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"aoi_list":[{"pk":1,"name":"a"},{"pk":2,"name":"b","is_active":true}]}"#);
        });

        let list = client_for(&server).aois().list(Some("POINT (1 2)"))?;
        mock.assert();
        assert_eq!(list.aoi_list.len(), 2);
        assert!(list.aoi_list[1].is_active);
        assert_eq!(list.aoi_list[0].created_at, "");
        Ok(())
    }

    #[test]
    fn embedded_error_on_get_is_application_failure() {
        let server = mock_server();
        server.mock(|when, then| {
            when.method("GET").path("/api/v2/aoi/5");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status":"error","error":"AOI matching query does not exist."}"#);
        });

        let err = client_for(&server).aois().get(5).expect_err("must fail");
        match err {
            GridError::Application { message, .. } => {
                assert_eq!(message, "AOI matching query does not exist.")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn generate_export_repeats_products() -> Result<()> {
        let server = mock_server();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/api/v2/aoi/9/generate/pointcloud")
                .query_param("products", "collect_a")
                .query_param("products", "collect_b")
                .query_param("file_export_options", "individual");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"task_id":"abc-123","export_id":77}"#);
        });

        let products = vec!["collect_a".to_string(), "collect_b".to_string()];
        let generated = client_for(&server).aois().generate_pointcloud_export(
            9,
            &products,
            &PointcloudExportOptions::default(),
        )?;
        mock.assert();
        assert_eq!(generated.task_id, "abc-123");
        assert_eq!(generated.export_id, 77);
        Ok(())
    }

    #[test]
    fn generate_export_requires_products() {
        let err = unreachable_client()
            .aois()
            .generate_pointcloud_export(9, &[" ".to_string()], &PointcloudExportOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, GridError::Validation(_)));
    }

    #[test]
    fn detail_round_trip_keeps_nested_sets() {
        let detail = AoiDetail {
            name: "Denver".into(),
            pk: 3,
            is_active: true,
            export_set: vec![Export {
                pk: 8,
                name: "e".into(),
                ..Export::default()
            }],
            raster_intersects: vec![RasterDataset {
                pk: 4,
                percent_coverage: 12.5,
                ..RasterDataset::default()
            }],
            ..AoiDetail::default()
        };
        let json = serde_json::to_string(&detail).expect("encode");
        let back: AoiDetail = serde_json::from_str(&json).expect("decode");
        assert_eq!(back, detail);
    }

    #[test]
    fn null_members_decode_as_zero_values() -> Result<()> {
        let server = mock_server();
        server.mock(|when, then| {
            when.method("GET").path("/api/v2/aoi/3");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"pk":3,"name":"Golden","notes":null,"created_at":null,"user":null,
                        "is_active":null,"export_set":null,
                        "pointcloud_intersects":[{"pk":1,"collected_at":null,"density":null}],
                        "raster_intersects":[{"pk":2,"sensor":null,"area":null}]}"#,
                );
        });

        let aoi = client_for(&server).aois().get(3)?;
        assert_eq!(aoi.name, "Golden");
        assert_eq!(aoi.notes, "");
        assert_eq!(aoi.user, 0);
        assert!(!aoi.is_active);
        assert!(aoi.export_set.is_empty());
        assert_eq!(aoi.pointcloud_intersects[0].collected_at, "");
        assert_eq!(aoi.raster_intersects[0].area, 0.0);

        let list: AoiList =
            serde_json::from_str(r#"{"aoi_list":[{"pk":1,"notes":null,"geometry":null}]}"#)
                .expect("decode");
        assert_eq!(list.aoi_list[0].geometry, "");
        let generated: GeneratedExport =
            serde_json::from_str(r#"{"task_id":null,"export_id":5}"#).expect("decode");
        assert_eq!(generated.task_id, "");
        Ok(())
    }
}

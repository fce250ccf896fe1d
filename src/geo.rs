use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Federative units
// ---------------------------------------------------------------------------

/// One federative unit: code, name and its cell in the tile-grid map
/// (column, row; row 0 is the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTile {
    pub code: &'static str,
    pub name: &'static str,
    pub col: u8,
    pub row: u8,
}

const fn tile(code: &'static str, name: &'static str, col: u8, row: u8) -> StateTile {
    StateTile { code, name, col, row }
}

pub const STATES: [StateTile; 27] = [
    tile("RR", "Roraima", 2, 0),
    tile("AP", "Amapá", 4, 0),
    tile("AM", "Amazonas", 1, 1),
    tile("PA", "Pará", 3, 1),
    tile("MA", "Maranhão", 4, 1),
    tile("CE", "Ceará", 5, 1),
    tile("RN", "Rio Grande do Norte", 6, 1),
    tile("AC", "Acre", 0, 2),
    tile("RO", "Rondônia", 1, 2),
    tile("MT", "Mato Grosso", 2, 2),
    tile("TO", "Tocantins", 3, 2),
    tile("PI", "Piauí", 4, 2),
    tile("PE", "Pernambuco", 5, 2),
    tile("PB", "Paraíba", 6, 2),
    tile("MS", "Mato Grosso do Sul", 2, 3),
    tile("GO", "Goiás", 3, 3),
    tile("DF", "Distrito Federal", 4, 3),
    tile("BA", "Bahia", 5, 3),
    tile("AL", "Alagoas", 6, 3),
    tile("SP", "São Paulo", 3, 4),
    tile("MG", "Minas Gerais", 4, 4),
    tile("ES", "Espírito Santo", 5, 4),
    tile("SE", "Sergipe", 6, 4),
    tile("PR", "Paraná", 3, 5),
    tile("RJ", "Rio de Janeiro", 4, 5),
    tile("SC", "Santa Catarina", 3, 6),
    tile("RS", "Rio Grande do Sul", 3, 7),
];

pub fn state_tile(code: &str) -> Option<&'static StateTile> {
    STATES.iter().find(|s| s.code.eq_ignore_ascii_case(code))
}

// ---------------------------------------------------------------------------
// Boundary polygons (GeoJSON)
// ---------------------------------------------------------------------------

/// Property that identifies a feature, as in `properties.sigla`.
pub const DEFAULT_FEATURE_KEY: &str = "sigla";

/// Outlines picked up without `--boundaries`, relative to the working directory.
pub const DEFAULT_BOUNDARIES_PATH: &str = "assets/brazil-states.geojson";

/// Public GeoJSON of the 27 federative units keyed by `sigla`; save it at
/// [`DEFAULT_BOUNDARIES_PATH`] to get map shapes out of the box.
pub const BOUNDARIES_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/codeforamerica/click_that_hood/master/public/data/brazil-states.geojson";

/// Outline of one region: one or more rings of `[lon, lat]` points.
/// Holes are dropped; only outer rings are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub code: String,
    pub rings: Vec<Vec<[f64; 2]>>,
}

/// Region outlines keyed by upper-case subdivision code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundarySet {
    regions: BTreeMap<String, Region>,
}

impl BoundarySet {
    /// Read a GeoJSON `FeatureCollection` from disk.
    pub fn load(path: &Path, feature_key: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading boundaries {}", path.display()))?;
        let set = Self::from_geojson(&text, feature_key)
            .with_context(|| format!("parsing boundaries {}", path.display()))?;
        log::info!("Loaded {} region outlines from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn from_geojson(text: &str, feature_key: &str) -> Result<Self, DashboardError> {
        let root: JsonValue = serde_json::from_str(text)
            .map_err(|e| DashboardError::InvalidBoundaries(e.to_string()))?;
        let features = root
            .get("features")
            .and_then(|f| f.as_array())
            .ok_or_else(|| DashboardError::InvalidBoundaries("no 'features' array".into()))?;

        let mut regions = BTreeMap::new();
        for (i, feature) in features.iter().enumerate() {
            let Some(code) = feature
                .get("properties")
                .and_then(|p| p.get(feature_key))
                .and_then(|v| v.as_str())
            else {
                log::warn!("Feature {i} has no '{feature_key}' property; skipped");
                continue;
            };
            let code = code.trim().to_ascii_uppercase();
            let rings = feature
                .get("geometry")
                .map(outer_rings)
                .transpose()?
                .unwrap_or_default();
            if rings.is_empty() {
                log::warn!("Feature {code} has no polygon geometry; skipped");
                continue;
            }
            regions.insert(code.clone(), Region { code, rings });
        }

        if regions.is_empty() {
            return Err(DashboardError::InvalidBoundaries(
                "no usable polygon features".into(),
            ));
        }
        Ok(BoundarySet { regions })
    }

    pub fn get(&self, code: &str) -> Option<&Region> {
        self.regions.get(&code.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn outer_rings(geometry: &JsonValue) -> Result<Vec<Vec<[f64; 2]>>, DashboardError> {
    let kind = geometry.get("type").and_then(|t| t.as_str()).unwrap_or("");
    let coords = geometry.get("coordinates");
    match (kind, coords) {
        ("Polygon", Some(c)) => Ok(polygon_outer(c)?.into_iter().collect()),
        ("MultiPolygon", Some(JsonValue::Array(polys))) => polys
            .iter()
            .map(polygon_outer)
            .filter_map(|r| r.transpose())
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// First ring of a polygon's coordinate array.
fn polygon_outer(polygon: &JsonValue) -> Result<Option<Vec<[f64; 2]>>, DashboardError> {
    let Some(ring) = polygon.as_array().and_then(|rings| rings.first()) else {
        return Ok(None);
    };
    let points = ring
        .as_array()
        .ok_or_else(|| DashboardError::InvalidBoundaries("ring is not an array".into()))?;
    points
        .iter()
        .map(|p| match p.as_array().map(|a| a.as_slice()) {
            Some([lon, lat, ..]) => match (lon.as_f64(), lat.as_f64()) {
                (Some(lon), Some(lat)) => Ok([lon, lat]),
                _ => Err(DashboardError::InvalidBoundaries(format!("bad position {p}"))),
            },
            _ => Err(DashboardError::InvalidBoundaries(format!("bad position {p}"))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"sigla": "SP", "name": "São Paulo"},
             "geometry": {"type": "Polygon",
                          "coordinates": [[[-53.0,-22.0],[-44.0,-22.0],[-44.0,-25.0],[-53.0,-22.0]],
                                          [[-50.0,-23.0],[-49.0,-23.0],[-49.0,-24.0],[-50.0,-23.0]]]}},
            {"type": "Feature", "properties": {"sigla": "ba"},
             "geometry": {"type": "MultiPolygon",
                          "coordinates": [[[[-46.0,-10.0],[-38.0,-10.0],[-38.0,-18.0],[-46.0,-10.0]]],
                                          [[[-38.5,-13.0],[-38.4,-13.0],[-38.4,-13.1],[-38.5,-13.0]]]]}},
            {"type": "Feature", "properties": {"name": "sem sigla"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]
    }"#;

    #[test]
    fn parses_polygons_and_multipolygons() {
        let set = BoundarySet::from_geojson(SAMPLE, DEFAULT_FEATURE_KEY).unwrap();
        assert_eq!(set.len(), 2);
        let sp = set.get("SP").unwrap();
        assert_eq!(sp.rings.len(), 1, "holes are dropped");
        assert_eq!(sp.rings[0][1], [-44.0, -22.0]);
        assert_eq!(set.get("ba").unwrap().rings.len(), 2);
    }

    #[test]
    fn rejects_files_without_usable_features() {
        assert!(BoundarySet::from_geojson("{}", DEFAULT_FEATURE_KEY).is_err());
        assert!(BoundarySet::from_geojson("not json", DEFAULT_FEATURE_KEY).is_err());
        assert!(BoundarySet::from_geojson(SAMPLE, "codigo").is_err());
    }

    #[test]
    fn bad_coordinates_are_reported() {
        let text = r#"{"features":[{"properties":{"sigla":"AC"},
            "geometry":{"type":"Polygon","coordinates":[[["x","y"]]]}}]}"#;
        assert!(matches!(
            BoundarySet::from_geojson(text, DEFAULT_FEATURE_KEY),
            Err(DashboardError::InvalidBoundaries(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        assert!(BoundarySet::load(Path::new("/nonexistent/brazil.geojson"), "sigla").is_err());
    }

    #[test]
    fn tile_grid_covers_every_state_once() {
        let codes: BTreeSet<&str> = STATES.iter().map(|s| s.code).collect();
        let cells: BTreeSet<(u8, u8)> = STATES.iter().map(|s| (s.col, s.row)).collect();
        assert_eq!(codes.len(), 27);
        assert_eq!(cells.len(), 27);
        assert_eq!(state_tile("df").map(|s| s.name), Some("Distrito Federal"));
        assert!(state_tile("XX").is_none());
    }
}

//! Area extraction from GeoJSON feature collections.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::geometry::{Point, Polygon, Ring};
use super::index::{Area, AreaIndex};
use crate::error::LoadError;

/// Name used when a feature carries no string property at all
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// Property keys tried in order when naming an area.
///
/// Covers the common Australian locality datasets.
pub const NAME_KEYS: &[&str] = &[
    "NAME",
    "Name",
    "name",
    "LOCALITY_NAME",
    "LOCALITY",
    "LOC_NAME",
    "vic_loca_2",
    "vic_loca_1",
    "vic_loca_",
    "SUBURB_NAME",
    "SuburbName",
    "suburb",
];

/// Load areas from a GeoJSON file; `.gz` files are decompressed on the fly
pub fn load_areas_from_path(path: &Path) -> Result<AreaIndex, LoadError> {
    info!("Loading suburbs from {}", path.display());

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    load_areas(BufReader::new(reader))
}

pub fn load_areas<R: Read>(reader: R) -> Result<AreaIndex, LoadError> {
    let document: Value = serde_json::from_reader(reader)?;
    load_areas_from_value(&document)
}

pub fn load_areas_from_str(geojson: &str) -> Result<AreaIndex, LoadError> {
    let document: Value = serde_json::from_str(geojson)?;
    load_areas_from_value(&document)
}

/// Build the area index from a parsed feature collection.
///
/// Features without an area geometry are skipped. Fails when nothing usable remains.
pub fn load_areas_from_value(document: &Value) -> Result<AreaIndex, LoadError> {
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or(LoadError::MissingFeatures)?;

    let empty = Map::new();
    let mut areas = Vec::new();

    for (idx, feature) in features.iter().enumerate() {
        let geometry = match feature.get("geometry") {
            Some(g) if !g.is_null() => g,
            _ => {
                debug!("Feature {} has no geometry, skipping", idx);
                continue;
            }
        };

        let coords = geometry.get("coordinates").unwrap_or(&Value::Null);
        let polygons = match geometry.get("type").and_then(Value::as_str) {
            Some("Polygon") => parse_polygon(idx, coords)?.into_iter().collect(),
            Some("MultiPolygon") => {
                let mut polygons = Vec::new();
                for polygon_coords in as_array(idx, coords, "MultiPolygon coordinates")? {
                    polygons.extend(parse_polygon(idx, polygon_coords)?);
                }
                polygons
            }
            other => {
                debug!("Feature {} has non-area geometry {:?}, skipping", idx, other);
                continue;
            }
        };

        let props = feature
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let name = resolve_area_name(props);

        if polygons.is_empty() {
            warn!("Feature {} ({}) has no polygons, skipping", idx, name);
            continue;
        }

        areas.push(Area::new(name, polygons));
    }

    if areas.is_empty() {
        return Err(LoadError::NoAreas);
    }

    let index = AreaIndex::build(areas);
    info!("Suburbs loaded: {}", index.len());
    Ok(index)
}

/// Pick a display name: well-known keys first, then the first string property
pub fn resolve_area_name(props: &Map<String, Value>) -> String {
    NAME_KEYS
        .iter()
        .find_map(|key| props.get(*key).and_then(Value::as_str))
        .or_else(|| props.values().find_map(Value::as_str))
        .unwrap_or(UNKNOWN_NAME)
        .to_string()
}

/// One polygon: `[outer, hole, hole, ...]`. `None` when there are no rings.
fn parse_polygon(feature: usize, coords: &Value) -> Result<Option<Polygon>, LoadError> {
    let rings = as_array(feature, coords, "Polygon coordinates")?
        .iter()
        .map(|ring_coords| parse_ring(feature, ring_coords))
        .collect::<Result<Vec<_>, _>>()?;

    if rings.is_empty() {
        warn!("Feature {} has a polygon without rings, skipping it", feature);
        return Ok(None);
    }
    Ok(Some(Polygon::new(rings)))
}

fn parse_ring(feature: usize, coords: &Value) -> Result<Ring, LoadError> {
    let points = as_array(feature, coords, "ring")?
        .iter()
        .map(|position| parse_position(feature, position))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ring::closed(points))
}

/// `[lon, lat]` or `[lon, lat, alt]`
fn parse_position(feature: usize, position: &Value) -> Result<Point, LoadError> {
    let values = as_array(feature, position, "position")?;
    match (
        values.first().and_then(Value::as_f64),
        values.get(1).and_then(Value::as_f64),
    ) {
        (Some(lon), Some(lat)) => Ok(Point::new(lon, lat)),
        _ => Err(LoadError::Malformed {
            feature,
            reason: format!("position {} is not a [lon, lat] pair", position),
        }),
    }
}

fn as_array<'a>(feature: usize, value: &'a Value, what: &str) -> Result<&'a Vec<Value>, LoadError> {
    value.as_array().ok_or_else(|| LoadError::Malformed {
        feature,
        reason: format!("{} must be an array", what),
    })
}

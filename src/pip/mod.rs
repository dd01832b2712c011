//! Point-in-Polygon (PIP) suburb classification.
//!
//! Loads suburb boundaries from GeoJSON and attributes observation points
//! to suburbs with bounding-box rejection followed by ray casting.

mod geometry;
mod index;
mod loader;
mod tally;

pub use geometry::{point_in_polygon, point_in_ring, ring_bounds, BoundingBox, Point, Polygon, Ring};
pub use index::{point_in_area, Area, AreaIndex};
pub use loader::{
    load_areas, load_areas_from_path, load_areas_from_str, load_areas_from_value,
    resolve_area_name, NAME_KEYS, UNKNOWN_NAME,
};
pub use tally::{assign, Assignment, CountTable, TopArea};

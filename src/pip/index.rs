//! Ordered area collection with an R-tree over area bounding boxes.

use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::geometry::{BoundingBox, Point, Polygon};

/// A named region (e.g. a suburb) made of one or more polygons
#[derive(Debug, Clone)]
pub struct Area {
    name: String,
    polygons: Vec<Polygon>,
    bbox: BoundingBox,
}

impl Area {
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        let bbox = polygons
            .iter()
            .map(Polygon::bbox)
            .fold(BoundingBox::EMPTY, BoundingBox::union);
        Self {
            name: name.into(),
            polygons,
            bbox,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn contains(&self, point: &Point) -> bool {
        point_in_area(self, point)
    }
}

/// Area-level box reject, then any owned polygon
pub fn point_in_area(area: &Area, point: &Point) -> bool {
    if !area.bbox.contains(point) {
        return false;
    }
    area.polygons.iter().any(|polygon| polygon.contains(point))
}

/// R-tree entry pointing back at an area's stored position
#[derive(Debug, Clone)]
struct IndexedArea {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedArea {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedArea {
    fn new(position: usize, area: &Area) -> Option<Self> {
        let bbox = area.bbox();
        if bbox.is_empty() {
            return None;
        }
        Some(Self {
            position,
            envelope: AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]),
        })
    }
}

/// Areas in stored order.
///
/// Stored order is part of the contract: when areas overlap, a point belongs
/// to the first one (lowest position) that contains it.
#[derive(Debug)]
pub struct AreaIndex {
    areas: Vec<Area>,
    tree: RTree<IndexedArea>,
    bbox: BoundingBox,
}

impl AreaIndex {
    /// Build the index, keeping `areas` in the order given
    pub fn build(areas: Vec<Area>) -> Self {
        let mut indexed = Vec::with_capacity(areas.len());
        let mut bbox = BoundingBox::EMPTY;
        for (position, area) in areas.iter().enumerate() {
            bbox = bbox.union(area.bbox());
            indexed.extend(IndexedArea::new(position, area));
        }

        let tree = RTree::bulk_load(indexed);
        info!(
            "Area index built with {} areas ({} with extent)",
            areas.len(),
            tree.size()
        );

        Self { areas, tree, bbox }
    }

    /// First area in stored order containing the point
    pub fn first_containing(&self, point: &Point) -> Option<&Area> {
        let query_envelope = AABB::from_point([point.lon, point.lat]);

        // Candidates come back in tree order, so pick the lowest position explicitly
        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ia| self.areas[ia.position].contains(point))
            .map(|ia| ia.position)
            .min()
            .map(|position| &self.areas[position])
    }

    /// Union of every area's box
    pub fn bounds(&self) -> BoundingBox {
        self.bbox
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

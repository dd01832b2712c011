//! Planar geometry kernel: rings, polygons with holes, and bounding boxes.
//!
//! All computation happens directly in lon/lat space. That is a deliberate
//! approximation which holds up at city scale.

/// Sentinel used for the extent of an empty box.
const NO_EXTENT: f64 = 1e300;

/// Added to the latitude span of an edge so near-horizontal edges never divide by zero.
const EDGE_EPSILON: f64 = 1e-20;

/// Geographic point (lon/lat degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// The box with no extent. Identity element for [`BoundingBox::union`].
    pub const EMPTY: BoundingBox = BoundingBox {
        min_lon: NO_EXTENT,
        min_lat: NO_EXTENT,
        max_lon: -NO_EXTENT,
        max_lat: -NO_EXTENT,
    };

    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box covering every point
    pub fn of_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        points.into_iter().fold(Self::EMPTY, |bbox, p| Self {
            min_lon: bbox.min_lon.min(p.lon),
            min_lat: bbox.min_lat.min(p.lat),
            max_lon: bbox.max_lon.max(p.lon),
            max_lat: bbox.max_lat.max(p.lat),
        })
    }

    pub fn union(self, other: BoundingBox) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// True when the box covers nothing (e.g. built from an empty ring)
    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    /// Inclusive containment with exact comparison. NaN coordinates are never contained.
    pub fn contains(&self, point: &Point) -> bool {
        point.lon >= self.min_lon
            && point.lon <= self.max_lon
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    /// True when `other` lies entirely within this box
    pub fn covers(&self, other: &BoundingBox) -> bool {
        other.is_empty()
            || (self.min_lon <= other.min_lon
                && self.min_lat <= other.min_lat
                && self.max_lon >= other.max_lon
                && self.max_lat >= other.max_lat)
    }
}

/// One loop of vertices. Closure is optional; edges wrap around by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ring {
    pub points: Vec<Point>,
}

impl Ring {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build a ring, repeating the first vertex at the end if the loop is open
    pub fn closed(mut points: Vec<Point>) -> Self {
        if let (Some(&first), Some(last)) = (points.first(), points.last()) {
            if first != *last {
                points.push(first);
            }
        }
        Self { points }
    }

    pub fn is_closed(&self) -> bool {
        self.points.first() == self.points.last()
    }

    pub fn bounds(&self) -> BoundingBox {
        ring_bounds(self)
    }
}

/// Outer ring plus holes, with a precomputed bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    rings: Vec<Ring>,
    bbox: BoundingBox,
}

impl Polygon {
    /// `rings[0]` is the outer boundary, `rings[1..]` are holes.
    pub fn new(rings: Vec<Ring>) -> Self {
        let bbox = rings
            .iter()
            .map(Ring::bounds)
            .fold(BoundingBox::EMPTY, BoundingBox::union);
        Self { rings, bbox }
    }

    /// Polygon with a caller-supplied box, used to exercise box rejection
    #[cfg(test)]
    pub(crate) fn with_bounds(rings: Vec<Ring>, bbox: BoundingBox) -> Self {
        Self { rings, bbox }
    }

    pub fn outer(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn contains(&self, point: &Point) -> bool {
        point_in_polygon(self, point)
    }
}

/// Axis-aligned bounds of a ring. An empty ring yields [`BoundingBox::EMPTY`].
pub fn ring_bounds(ring: &Ring) -> BoundingBox {
    BoundingBox::of_points(&ring.points)
}

/// Even-odd ray casting towards increasing longitude.
///
/// Points exactly on an edge or vertex may land on either side.
pub fn point_in_ring(ring: &Ring, q: &Point) -> bool {
    let points = &ring.points;
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = points[j];
        let b = points[i];
        // Half-open latitude span so a shared vertex is counted for one edge only
        if (a.lat > q.lat) != (b.lat > q.lat) {
            let x_cross = (b.lon - a.lon) * (q.lat - a.lat) / (b.lat - a.lat + EDGE_EPSILON) + a.lon;
            if q.lon <= x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Inside the outer ring and outside every hole
pub fn point_in_polygon(polygon: &Polygon, point: &Point) -> bool {
    if !polygon.bbox.contains(point) {
        return false;
    }
    let Some(outer) = polygon.outer() else {
        return false;
    };
    point_in_ring(outer, point) && !polygon.holes().iter().any(|hole| point_in_ring(hole, point))
}

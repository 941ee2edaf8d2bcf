//! ISO 19107 style wrapper over [`geo`] geometries.
//!
//! [`IsoGeometry`] pairs a `geo` geometry with its coordinate reference system and exposes the operations under their
//! ISO names. All computational geometry is done by `geo`; the wrapper only dispatches on the geometry dimension and
//! checks that both operands share the same CRS.

use std::sync::Arc;

use geo::dimensions::Dimensions;
use geo::{
    BooleanOps, BoundingRect, Centroid, ConvexHull, CoordsIter, EuclideanDistance,
    Geometry, HasDimensions, Line, LinesIter, MultiPoint, MultiPolygon, Relate,
};

use crate::crs::Crs;
use crate::envelope::Envelope;
use crate::error::GeocanvasTypesError;

mod boundary;

pub use boundary::{Boundary, CurveBoundary, SurfaceBoundary};

/// Geometry with an optional coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoGeometry {
    geometry: Geometry<f64>,
    crs: Option<Arc<Crs>>,
}

impl IsoGeometry {
    /// Wraps the geometry. The CRS, if given, must be 2-dimensional.
    pub fn new(
        geometry: impl Into<Geometry<f64>>,
        crs: Option<Arc<Crs>>,
    ) -> Result<Self, GeocanvasTypesError> {
        if let Some(crs) = &crs {
            if crs.dimension() != 2 {
                return Err(GeocanvasTypesError::InvalidArgument(format!(
                    "geometry CRS must be 2-dimensional, {crs} has {} axes",
                    crs.dimension()
                )));
            }
        }

        Ok(Self {
            geometry: geometry.into(),
            crs,
        })
    }

    /// Wrapped geometry.
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Coordinate reference system of the geometry.
    pub fn crs(&self) -> Option<&Arc<Crs>> {
        self.crs.as_ref()
    }

    /// Topological dimension: 0 for points, 1 for curves, 2 for surfaces, `None` for empty geometries.
    pub fn dimension(&self) -> Option<usize> {
        match self.geometry.dimensions() {
            Dimensions::Empty => None,
            Dimensions::ZeroDimensional => Some(0),
            Dimensions::OneDimensional => Some(1),
            Dimensions::TwoDimensional => Some(2),
        }
    }

    /// Boundary of the geometry.
    ///
    /// * points have no boundary (`None`),
    /// * an open curve is bounded by its end points,
    /// * a closed curve has an empty [`CurveBoundary`],
    /// * a surface is bounded by its rings.
    ///
    /// Boundaries of collections and multi-curves are not supported.
    pub fn boundary(&self) -> Result<Option<Boundary>, GeocanvasTypesError> {
        match &self.geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Ok(None),
            Geometry::Line(line) => Ok(Some(Boundary::Curve(CurveBoundary::from_line_string(
                &(*line).into(),
            )))),
            Geometry::LineString(line) => Ok(Some(Boundary::Curve(
                CurveBoundary::from_line_string(line),
            ))),
            Geometry::Polygon(polygon) => Ok(Some(Boundary::Surface(
                SurfaceBoundary::from_polygon(polygon),
            ))),
            Geometry::Rect(rect) => Ok(Some(Boundary::Surface(SurfaceBoundary::from_polygon(
                &rect.to_polygon(),
            )))),
            Geometry::Triangle(triangle) => Ok(Some(Boundary::Surface(
                SurfaceBoundary::from_polygon(&triangle.to_polygon()),
            ))),
            Geometry::MultiLineString(_)
            | Geometry::MultiPolygon(_)
            | Geometry::GeometryCollection(_) => Err(GeocanvasTypesError::UnsupportedOperation(
                "boundary of a geometry collection".into(),
            )),
        }
    }

    /// Bounding box of the geometry. `None` for empty geometries.
    pub fn envelope(&self) -> Result<Option<Envelope>, GeocanvasTypesError> {
        let Some(rect) = self.geometry.bounding_rect() else {
            return Ok(None);
        };

        Envelope::new(
            vec![rect.min().x, rect.min().y],
            vec![rect.max().x, rect.max().y],
            self.crs.clone(),
        )
        .map(Some)
    }

    /// Center of mass of the geometry. `None` for empty geometries.
    pub fn centroid(&self) -> Option<IsoGeometry> {
        let centroid = self.geometry.centroid()?;
        Some(self.with_geometry(centroid.into()))
    }

    /// Smallest convex polygon containing all vertices of the geometry.
    pub fn convex_hull(&self) -> IsoGeometry {
        let points: MultiPoint<f64> = self
            .geometry
            .coords_iter()
            .map(geo::Point::from)
            .collect::<Vec<_>>()
            .into();
        self.with_geometry(points.convex_hull().into())
    }

    /// Returns true if `other` lies in the interior of `self`.
    pub fn contains(&self, other: &IsoGeometry) -> Result<bool, GeocanvasTypesError> {
        self.check_crs(other)?;
        Ok(self.geometry.relate(&other.geometry).is_contains())
    }

    /// Returns true if the geometries share at least one point.
    pub fn intersects(&self, other: &IsoGeometry) -> Result<bool, GeocanvasTypesError> {
        self.check_crs(other)?;
        Ok(self.geometry.relate(&other.geometry).is_intersects())
    }

    /// Returns true if `self` lies in the interior of `other`.
    pub fn within(&self, other: &IsoGeometry) -> Result<bool, GeocanvasTypesError> {
        self.check_crs(other)?;
        Ok(self.geometry.relate(&other.geometry).is_within())
    }

    /// Returns true if the geometries have no points in common.
    pub fn disjoint(&self, other: &IsoGeometry) -> Result<bool, GeocanvasTypesError> {
        self.check_crs(other)?;
        Ok(self.geometry.relate(&other.geometry).is_disjoint())
    }

    /// Shortest euclidean distance between the geometries, zero if they intersect.
    pub fn distance(&self, other: &IsoGeometry) -> Result<f64, GeocanvasTypesError> {
        self.check_crs(other)?;
        if self.geometry.is_empty() || other.geometry.is_empty() {
            return Err(GeocanvasTypesError::InvalidArgument(
                "distance to an empty geometry".into(),
            ));
        }

        if self.geometry.relate(&other.geometry).is_intersects() {
            return Ok(0.0);
        }

        let a = segments(&self.geometry);
        let b = segments(&other.geometry);
        Ok(a.iter()
            .flat_map(|s| b.iter().map(move |t| s.euclidean_distance(t)))
            .fold(f64::INFINITY, f64::min))
    }

    /// Buffering is not available for this geometry backend: always fails with
    /// [`GeocanvasTypesError::UnsupportedOperation`].
    pub fn buffer(&self, _distance: f64) -> Result<IsoGeometry, GeocanvasTypesError> {
        Err(GeocanvasTypesError::UnsupportedOperation(
            "buffer is not supported".into(),
        ))
    }

    /// Points belonging to both geometries. Only surfaces are supported.
    pub fn intersection(&self, other: &IsoGeometry) -> Result<IsoGeometry, GeocanvasTypesError> {
        let (a, b) = self.surfaces(other, "intersection")?;
        Ok(self.with_geometry(a.intersection(&b).into()))
    }

    /// Points belonging to either of the geometries. Only surfaces are supported.
    pub fn union(&self, other: &IsoGeometry) -> Result<IsoGeometry, GeocanvasTypesError> {
        let (a, b) = self.surfaces(other, "union")?;
        Ok(self.with_geometry(a.union(&b).into()))
    }

    /// Points of `self` that do not belong to `other`. Only surfaces are supported.
    pub fn difference(&self, other: &IsoGeometry) -> Result<IsoGeometry, GeocanvasTypesError> {
        let (a, b) = self.surfaces(other, "difference")?;
        Ok(self.with_geometry(a.difference(&b).into()))
    }

    /// Points belonging to exactly one of the geometries. Only surfaces are supported.
    pub fn symmetric_difference(
        &self,
        other: &IsoGeometry,
    ) -> Result<IsoGeometry, GeocanvasTypesError> {
        let (a, b) = self.surfaces(other, "symmetric difference")?;
        Ok(self.with_geometry(a.xor(&b).into()))
    }

    fn with_geometry(&self, geometry: Geometry<f64>) -> IsoGeometry {
        IsoGeometry {
            geometry,
            crs: self.crs.clone(),
        }
    }

    fn check_crs(&self, other: &IsoGeometry) -> Result<(), GeocanvasTypesError> {
        match (&self.crs, &other.crs) {
            (Some(a), Some(b)) if a != b => Err(GeocanvasTypesError::InvalidArgument(format!(
                "geometries are in different coordinate systems: {a} and {b}"
            ))),
            _ => Ok(()),
        }
    }

    fn surfaces(
        &self,
        other: &IsoGeometry,
        operation: &str,
    ) -> Result<(MultiPolygon<f64>, MultiPolygon<f64>), GeocanvasTypesError> {
        self.check_crs(other)?;
        let a = as_multi_polygon(&self.geometry).ok_or_else(|| {
            GeocanvasTypesError::UnsupportedOperation(format!("{operation} of non-surfaces"))
        })?;
        let b = as_multi_polygon(&other.geometry).ok_or_else(|| {
            GeocanvasTypesError::UnsupportedOperation(format!("{operation} of non-surfaces"))
        })?;

        Ok((a, b))
    }
}

/// Edges of the geometry and its vertices as zero-length segments, so that isolated points are kept.
fn segments(geometry: &Geometry<f64>) -> Vec<Line<f64>> {
    geometry
        .lines_iter()
        .chain(geometry.coords_iter().map(|c| Line::new(c, c)))
        .collect()
}

fn as_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use geo::{line_string, point, polygon, Area, GeometryCollection, LineString};

    fn square(min: f64, max: f64) -> IsoGeometry {
        IsoGeometry::new(
            polygon![
                (x: min, y: min),
                (x: max, y: min),
                (x: max, y: max),
                (x: min, y: max),
                (x: min, y: min),
            ],
            Some(Arc::new(Crs::WGS84)),
        )
        .expect("valid geometry")
    }

    #[test]
    fn point_has_no_boundary() {
        let geometry = IsoGeometry::new(point!(x: 1.0, y: 2.0), None).expect("valid");
        assert_eq!(geometry.dimension(), Some(0));
        assert_eq!(geometry.boundary(), Ok(None));
    }

    #[test]
    fn open_curve_boundary() {
        let geometry = IsoGeometry::new(
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 0.0)],
            None,
        )
        .expect("valid");
        assert_eq!(geometry.dimension(), Some(1));

        let Ok(Some(Boundary::Curve(boundary))) = geometry.boundary() else {
            panic!("expected curve boundary");
        };
        assert_eq!(boundary.start_point(), Some(point!(x: 0.0, y: 0.0)));
        assert_eq!(boundary.end_point(), Some(point!(x: 2.0, y: 0.0)));
        assert!(!boundary.is_empty());
    }

    #[test]
    fn closed_ring_boundary_is_empty() {
        let geometry = IsoGeometry::new(
            line_string![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 2.0, y: 0.0),
                (x: 0.0, y: 0.0),
            ],
            None,
        )
        .expect("valid");

        let Ok(Some(Boundary::Curve(boundary))) = geometry.boundary() else {
            panic!("expected curve boundary");
        };
        assert!(boundary.is_empty());
        assert_eq!(boundary.start_point(), None);
        assert_eq!(boundary.end_point(), None);
    }

    #[test]
    fn surface_boundary() {
        let geometry = square(0.0, 1.0);
        assert_eq!(geometry.dimension(), Some(2));
        let Ok(Some(Boundary::Surface(boundary))) = geometry.boundary() else {
            panic!("expected surface boundary");
        };
        assert_eq!(boundary.exterior().0.len(), 5);
        assert!(boundary.interiors().is_empty());
    }

    #[test]
    fn collection_boundary_is_unsupported() {
        let geometry = IsoGeometry::new(
            GeometryCollection::new_from(vec![point!(x: 1.0, y: 1.0).into()]),
            None,
        )
        .expect("valid");
        assert_matches!(
            geometry.boundary(),
            Err(GeocanvasTypesError::UnsupportedOperation(_))
        );
    }

    #[test]
    fn envelope_and_centroid() {
        let geometry = square(-10.0, 10.0);
        let envelope = geometry.envelope().expect("valid").expect("not empty");
        assert_eq!(envelope.lower_corner(), &[-10.0, -10.0]);
        assert_eq!(envelope.upper_corner(), &[10.0, 10.0]);
        assert_eq!(envelope.crs(), Some(&Arc::new(Crs::WGS84)));

        let centroid = geometry.centroid().expect("not empty");
        assert_eq!(centroid.geometry(), &Geometry::Point(point!(x: 0.0, y: 0.0)));

        let empty = IsoGeometry::new(LineString::<f64>::new(vec![]), None).expect("valid");
        assert_eq!(empty.envelope(), Ok(None));
        assert_eq!(empty.dimension(), None);
    }

    #[test]
    fn predicates() {
        let big = square(0.0, 10.0);
        let small = square(2.0, 3.0);
        let far = square(20.0, 30.0);

        assert_eq!(big.contains(&small), Ok(true));
        assert_eq!(small.within(&big), Ok(true));
        assert_eq!(big.intersects(&small), Ok(true));
        assert_eq!(big.disjoint(&far), Ok(true));
        assert_eq!(big.intersects(&far), Ok(false));

        let other_crs = IsoGeometry::new(point!(x: 1.0, y: 1.0), Some(Arc::new(Crs::EPSG3857)))
            .expect("valid");
        assert_matches!(
            big.contains(&other_crs),
            Err(GeocanvasTypesError::InvalidArgument(_))
        );
    }

    #[test]
    fn set_operations() {
        let a = square(0.0, 2.0);
        let b = square(1.0, 3.0);

        let area = |g: IsoGeometry| g.geometry().unsigned_area();
        assert!((area(a.union(&b).expect("surfaces")) - 7.0).abs() < 1e-9);
        assert!((area(a.intersection(&b).expect("surfaces")) - 1.0).abs() < 1e-9);
        assert!((area(a.difference(&b).expect("surfaces")) - 3.0).abs() < 1e-9);
        assert!((area(a.symmetric_difference(&b).expect("surfaces")) - 6.0).abs() < 1e-9);

        let line = IsoGeometry::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)], None)
            .expect("valid");
        assert_matches!(
            a.union(&line),
            Err(GeocanvasTypesError::UnsupportedOperation(_))
        );
    }

    #[test]
    fn distance() {
        let a = square(0.0, 1.0);
        let b = square(3.0, 4.0);
        assert!((a.distance(&b).expect("same crs") - 2.0 * 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(a.distance(&square(0.5, 2.0)), Ok(0.0));

        let p = IsoGeometry::new(point!(x: 0.5, y: 5.0), Some(Arc::new(Crs::WGS84))).expect("valid");
        assert!((a.distance(&p).expect("same crs") - 4.0).abs() < 1e-9);

        assert_matches!(
            a.buffer(1.0),
            Err(GeocanvasTypesError::UnsupportedOperation(_))
        );
    }

    #[test]
    fn convex_hull() {
        let geometry = IsoGeometry::new(
            line_string![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.5),
                (x: 2.0, y: 0.0),
                (x: 1.0, y: 2.0),
            ],
            None,
        )
        .expect("valid");
        let hull = geometry.convex_hull();
        let Geometry::Polygon(polygon) = hull.geometry() else {
            panic!("expected polygon");
        };
        // Interior vertex is dropped, ring is closed.
        assert_eq!(polygon.exterior().0.len(), 4);
    }
}

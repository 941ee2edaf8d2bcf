use crate::cartesian::NewCartesianPoint2d;
use crate::geo::point::NewGeoPoint;
use crate::geo::projection::Projection;
use geodesy::prelude::*;
use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// Projection defined by a `geodesy` operator pipeline, e.g. `"utm zone=32"`.
///
/// The operator is parsed once. Its context is guarded by a lock, so concurrent projections through the same
/// instance are serialized.
pub struct GeodesyProjection<In, Out> {
    definition: String,
    operator: Mutex<(Minimal, OpHandle)>,
    phantom_in: PhantomData<In>,
    phantom_out: PhantomData<Out>,
}

impl<In, Out> GeodesyProjection<In, Out> {
    /// Creates a projection from an operator definition. Returns `None` if the definition cannot be parsed.
    pub fn new(definition: &str) -> Option<Self> {
        let mut context = Minimal::new();
        let op = context.op(definition).ok()?;
        Some(Self {
            definition: definition.to_string(),
            operator: Mutex::new((context, op)),
            phantom_in: Default::default(),
            phantom_out: Default::default(),
        })
    }

    /// Operator definition of the projection.
    pub fn definition(&self) -> &str {
        &self.definition
    }

    fn apply(&self, direction: Direction, data: &mut [Coor2D; 1]) -> Option<()> {
        {
            let operator = self.operator.lock();
            let (context, op) = &*operator;
            context.apply(*op, direction, data).ok()?;
        }

        if !data[0].0[0].is_finite() || !data[0].0[1].is_finite() {
            return None;
        }

        Some(())
    }
}

impl<In, Out> Debug for GeodesyProjection<In, Out> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeodesyProjection")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl<In: NewGeoPoint<f64>, Out: NewCartesianPoint2d<f64>> Projection
    for GeodesyProjection<In, Out>
{
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        let mut data = [Coor2D::geo(input.lat(), input.lon())];
        self.apply(Fwd, &mut data)?;

        Some(Out::new(data[0].0[0], data[0].0[1]))
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        let mut data = [Coor2D([input.x(), input.y()])];
        self.apply(Inv, &mut data)?;

        Some(In::latlon(
            data[0].0[1].to_degrees(),
            data[0].0[0].to_degrees(),
        ))
    }
}

//! Creation of coordinate operations between coordinate reference systems.

use std::sync::Arc;

use geocanvas_types::crs::{Crs, CrsKind};
use log::debug;

use crate::error::CanvasError;
use crate::transform::{MapProjection, MathTransform};

/// Finds a math transform converting coordinates from one CRS into another.
///
/// Operation lookup may be expensive, that is why the canvas caches the operations into its objective CRS.
pub trait OperationFactory: Send + Sync {
    /// Creates a transform from `source` into `target`. Fails with [`CanvasError::Factory`] if no operation path
    /// exists.
    fn create_operation(&self, source: &Crs, target: &Crs) -> Result<MathTransform, CanvasError>;
}

/// Operation factory knowing about the coordinate systems defined in `geocanvas_types`.
///
/// Supported operations:
/// * identical systems,
/// * derived systems, through their affine conversion,
/// * compound systems, component by component, or by selecting the matching component,
/// * geographic and projected systems on the same datum,
/// * temporal systems with different epochs or units,
/// * vertical and engineering systems with different units of length.
///
/// Datum shifts are not supported.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultOperationFactory;

impl DefaultOperationFactory {
    /// Creates a new factory.
    pub fn new() -> Self {
        Self
    }

    fn projection(crs: &Crs) -> Result<Arc<MapProjection>, CanvasError> {
        crs.get_projection()
            .map(Arc::from)
            .ok_or_else(|| CanvasError::Factory(format!("projection of {crs} is not available")))
    }

    fn no_path(source: &Crs, target: &Crs) -> CanvasError {
        CanvasError::Factory(format!(
            "no coordinate operation from {source} to {target}"
        ))
    }

    fn compound_operation(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> Result<MathTransform, CanvasError> {
        let source_components = source.components();
        let target_components = target.components();

        match (source_components.len(), target_components.len()) {
            (1, 1) => self.create_operation(source_components[0], target_components[0]),
            (s, t) if s == t => {
                let parts = source_components
                    .iter()
                    .zip(&target_components)
                    .map(|(s, t)| self.create_operation(s, t))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MathTransform::PassThrough(parts))
            }
            (s, 1) if s > 1 => {
                // Drop the axes that the target system does not have.
                let mut offset = 0;
                for component in &source_components {
                    let dimension = component.dimension();
                    if let Ok(operation) = self.create_operation(component, target) {
                        let select = MathTransform::Select {
                            source_dimension: source.dimension(),
                            indices: (offset..offset + dimension).collect(),
                        };
                        return select.concatenate(operation);
                    }
                    offset += dimension;
                }

                Err(Self::no_path(source, target))
            }
            _ => Err(Self::no_path(source, target)),
        }
    }
}

impl OperationFactory for DefaultOperationFactory {
    fn create_operation(&self, source: &Crs, target: &Crs) -> Result<MathTransform, CanvasError> {
        if source == target {
            return Ok(MathTransform::Identity(source.dimension()));
        }

        debug!("Searching coordinate operation from {source} to {target}");

        match (source.kind(), target.kind()) {
            (CrsKind::Compound { .. }, _) | (_, CrsKind::Compound { .. }) => {
                self.compound_operation(source, target)
            }
            (_, CrsKind::Derived { base, conversion }) => {
                let to_base = self.create_operation(source, base)?;
                to_base.concatenate(MathTransform::Affine(*conversion))
            }
            (CrsKind::Derived { base, conversion }, _) => {
                let from_base = self.create_operation(base, target)?;
                MathTransform::Affine(*conversion)
                    .inverse()
                    .map_err(|e| CanvasError::Factory(e.to_string()))?
                    .concatenate(from_base)
            }
            (CrsKind::Geographic { datum: s }, CrsKind::Geographic { datum: t }) if s == t => {
                Ok(MathTransform::Identity(2))
            }
            (CrsKind::Geographic { datum: s }, CrsKind::Projected { datum: t, .. }) if s == t => {
                Ok(MathTransform::Projection {
                    projection: Self::projection(target)?,
                    inverse: false,
                })
            }
            (CrsKind::Projected { datum: s, .. }, CrsKind::Geographic { datum: t }) if s == t => {
                Ok(MathTransform::Projection {
                    projection: Self::projection(source)?,
                    inverse: true,
                })
            }
            (CrsKind::Projected { datum: s, .. }, CrsKind::Projected { datum: t, .. }) if s == t => {
                let unproject = MathTransform::Projection {
                    projection: Self::projection(source)?,
                    inverse: true,
                };
                let project = MathTransform::Projection {
                    projection: Self::projection(target)?,
                    inverse: false,
                };
                unproject.concatenate(project)
            }
            (CrsKind::Engineering { unit: s }, CrsKind::Engineering { unit: t })
            | (CrsKind::Vertical { unit: s }, CrsKind::Vertical { unit: t }) => {
                let (Some(s), Some(t)) = (s.to_metres(), t.to_metres()) else {
                    return Err(Self::no_path(source, target));
                };
                let scale = s / t;
                if target.dimension() == 1 {
                    Ok(MathTransform::Linear { scale, offset: 0.0 })
                } else {
                    Ok(MathTransform::Affine(nalgebra::Matrix3::new_scaling(scale)))
                }
            }
            (
                CrsKind::Temporal {
                    epoch: source_epoch,
                    unit: source_unit,
                },
                CrsKind::Temporal {
                    epoch: target_epoch,
                    unit: target_unit,
                },
            ) => {
                let (Some(s), Some(t)) = (source_unit.to_seconds(), target_unit.to_seconds())
                else {
                    return Err(Self::no_path(source, target));
                };
                let epoch_shift =
                    (*source_epoch - *target_epoch).num_milliseconds() as f64 / 1000.0;
                Ok(MathTransform::Linear {
                    scale: s / t,
                    offset: epoch_shift / t,
                })
            }
            _ => Err(Self::no_path(source, target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use geocanvas_types::crs::Unit;
    use geocanvas_types::geo::Datum;
    use nalgebra::{Matrix3, Vector2};

    #[test]
    fn same_crs_is_identity() {
        let op = DefaultOperationFactory
            .create_operation(&Crs::WGS84, &Crs::geographic("copy", Datum::WGS84))
            .expect("same system");
        assert!(op.is_identity());
        assert_eq!(op.source_dimension(), 2);
    }

    #[test]
    fn geographic_to_mercator() {
        let op = DefaultOperationFactory
            .create_operation(&Crs::WGS84, &Crs::EPSG3857)
            .expect("same datum");
        let projected = op.transform(&[10.0, 52.0]).expect("inside domain");
        assert_abs_diff_eq!(projected[0], 1_113_194.9, epsilon = 0.1);
        assert_abs_diff_eq!(projected[1], 6_800_125.5, epsilon = 0.1);

        let back = DefaultOperationFactory
            .create_operation(&Crs::EPSG3857, &Crs::WGS84)
            .expect("same datum")
            .transform(&projected)
            .expect("inside domain");
        assert_abs_diff_eq!(back[0], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back[1], 52.0, epsilon = 1e-9);
    }

    #[test]
    fn no_path_between_unrelated_systems() {
        let local = Crs::engineering("local grid", Unit::Pixel);
        assert_matches!(
            DefaultOperationFactory.create_operation(&Crs::WGS84, &local),
            Err(CanvasError::Factory(_))
        );
        assert_matches!(
            DefaultOperationFactory
                .create_operation(&Crs::WGS84, &Crs::geographic("grs80", Datum::GRS80)),
            Err(CanvasError::Factory(_))
        );
    }

    #[test]
    fn derived_systems() {
        let base = Arc::new(Crs::WGS84);
        let conversion = Matrix3::new_translation(&Vector2::new(100.0, 50.0));
        let derived = Crs::derived("display", base.clone(), conversion).expect("2d base");

        let forward = DefaultOperationFactory
            .create_operation(&Crs::WGS84, &derived)
            .expect("derived from source");
        assert_eq!(forward.as_affine(), Some(conversion));

        let backward = DefaultOperationFactory
            .create_operation(&derived, &Crs::EPSG3857)
            .expect("base is convertible");
        let projected = backward.transform(&[100.0, 50.0]).expect("inside domain");
        assert_abs_diff_eq!(projected[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(projected[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn compound_systems() {
        let source = Crs::compound("wgs84 + time", [Crs::WGS84, Crs::unix_time()]).expect("valid");
        let days = Crs::temporal(
            "days since 2000",
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            Unit::Day,
        )
        .expect("valid");
        let target = Crs::compound("wgs84 + days", [Crs::WGS84, days]).expect("valid");

        let op = DefaultOperationFactory
            .create_operation(&source, &target)
            .expect("component-wise");
        let transformed = op.transform(&[1.0, 2.0, 946_684_800.0 + 86_400.0]).expect("valid");
        assert_abs_diff_eq!(transformed[2], 1.0, epsilon = 1e-9);

        let horizontal = DefaultOperationFactory
            .create_operation(&source, &Crs::WGS84)
            .expect("select horizontal");
        assert_eq!(
            horizontal.transform(&[1.0, 2.0, 3.0]).expect("valid"),
            vec![1.0, 2.0]
        );

        assert_matches!(
            DefaultOperationFactory.create_operation(&Crs::WGS84, &source),
            Err(CanvasError::Factory(_))
        );
    }

    #[test]
    fn vertical_units() {
        let metres = Crs::ellipsoidal_height();
        let feet = Crs::vertical("height ft", Unit::Foot).expect("linear");
        let op = DefaultOperationFactory
            .create_operation(&feet, &metres)
            .expect("unit conversion");
        assert_abs_diff_eq!(op.transform(&[10.0]).expect("1d")[0], 3.048);
    }
}

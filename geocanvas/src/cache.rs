//! See [`TransformCache`].

use ahash::{HashMap, HashMapExt};
use geocanvas_types::crs::{Crs, CrsKind};
use log::debug;

use crate::error::CanvasError;
use crate::operation::OperationFactory;
use crate::transform::MathTransform;

/// Memoizes transforms from arbitrary source systems into the objective CRS of a canvas.
///
/// The cache does not know the objective CRS by itself: it is given on every lookup, and the owner of the cache must
/// [`clear`](TransformCache::clear) it when the objective CRS changes.
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: HashMap<Crs, MathTransform>,
}

impl TransformCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns a transform from `source` into `target`.
    ///
    /// Lookup order:
    /// 1. identical systems give an identity transform;
    /// 2. if `target` is the `objective` CRS, a memoized transform is returned if there is one;
    /// 3. if one system is derived from the other, its conversion (or the inverse of it) is used directly;
    /// 4. otherwise the `factory` is asked for an operation.
    ///
    /// Transforms are memoized only when `target` is the objective CRS.
    pub fn resolve(
        &mut self,
        factory: &dyn OperationFactory,
        source: &Crs,
        target: &Crs,
        objective: &Crs,
    ) -> Result<MathTransform, CanvasError> {
        if source == target {
            return Ok(MathTransform::Identity(source.dimension()));
        }

        let to_objective = target == objective;
        if to_objective {
            if let Some(transform) = self.entries.get(source) {
                return Ok(transform.clone());
            }
        }

        let transform = match (source.kind(), target.kind()) {
            (_, CrsKind::Derived { base, conversion }) if **base == *source => {
                MathTransform::Affine(*conversion)
            }
            (CrsKind::Derived { base, conversion }, _) if **base == *target => {
                MathTransform::Affine(*conversion).inverse()?
            }
            _ => {
                debug!("Transform cache miss: {source} -> {target}");
                factory.create_operation(source, target)?
            }
        };

        if to_objective {
            self.entries.insert(source.clone(), transform.clone());
        }

        Ok(transform)
    }

    /// Removes all memoized transforms.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!("Clearing {} cached transforms", self.entries.len());
        }
        self.entries.clear();
    }

    /// Number of memoized transforms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Cross-module scene graph behavior

mod graph_properties;

use std::cell::Cell;

use crate::bounding::BoundingVolume;
use crate::render::{Culler, FrustumIntersect};

/// Culler wrapper counting frustum tests
pub(super) struct CountingCuller<C: Culler> {
    pub inner: C,
    pub frustum_tests: Cell<usize>,
}

impl<C: Culler> CountingCuller<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            frustum_tests: Cell::new(0),
        }
    }
}

impl<C: Culler> Culler for CountingCuller<C> {
    fn contains(&self, bound: &BoundingVolume) -> FrustumIntersect {
        self.frustum_tests.set(self.frustum_tests.get() + 1);
        self.inner.contains(bound)
    }

    fn contains_gui(&self, bound: &BoundingVolume) -> bool {
        self.frustum_tests.set(self.frustum_tests.get() + 1);
        self.inner.contains_gui(bound)
    }
}

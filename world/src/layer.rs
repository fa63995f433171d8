use std::sync::Arc;

use gridsly_core::{Coord, Point, PointId};

/// Immutable point sequence held by one grid layer.
///
/// Cloning a layer is cheap and yields a handle to the same revision; grid
/// mutations build a new sequence instead of editing in place, so a handle
/// obtained before a mutation keeps observing the old contents.
#[derive(Clone, Debug)]
pub struct Layer {
    points: Arc<[Point]>,
}

impl Layer {
    pub(crate) fn from_points(points: Vec<Point>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Points stored in the layer in insertion order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether the layer holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reports whether both handles refer to the same layer revision.
    #[must_use]
    pub fn same_revision(&self, other: &Layer) -> bool {
        Arc::ptr_eq(&self.points, &other.points)
    }

    pub(crate) fn position(&self, cell: Coord) -> Option<usize> {
        self.points.iter().position(|point| point.cell == cell)
    }

    pub(crate) fn position_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|point| point.id == id)
    }

    pub(crate) fn find(&self, cell: Coord) -> Option<&Point> {
        self.points.iter().find(|point| point.cell == cell)
    }

    pub(crate) fn with_appended(&self, added: impl IntoIterator<Item = Point>) -> Self {
        let mut points = self.points.to_vec();
        points.extend(added);
        Self::from_points(points)
    }

    pub(crate) fn without(&self, index: usize) -> Self {
        let mut points = self.points.to_vec();
        let _ = points.remove(index);
        Self::from_points(points)
    }

    pub(crate) fn with_replaced(&self, index: usize, point: Point) -> Self {
        let mut points = self.points.to_vec();
        points[index] = point;
        Self::from_points(points)
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::from_points(Vec::new())
    }
}

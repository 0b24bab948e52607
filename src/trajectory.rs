//! Bounded streaming trajectory storage.
//!
//! [`TrajectoryBuffer`] keeps the most recent `capacity` points of an
//! unbounded trajectory in a fixed ring and hands out render-ready snapshots:
//! a linear, oldest-first copy of positions and colors plus the number of line
//! segments connecting them.
//!
//! The line topology never changes shape. Point `i` of a snapshot is always
//! followed by point `i + 1`, so a single index table `{0,1},{1,2},...` sized
//! for the full capacity is built once and every snapshot just reports how
//! much of it is valid.
//!
//! # Example
//!
//! ```
//! use glam::{Vec3, Vec4};
//! use lorenz_trail::{ColoredPoint, TrajectoryBuffer};
//!
//! let mut trail = TrajectoryBuffer::new(3).unwrap();
//! for x in 0..5 {
//!     trail.push(ColoredPoint::new(Vec3::new(x as f32, 0.0, 0.0), Vec4::ONE));
//! }
//!
//! let snapshot = trail.snapshot();
//! assert_eq!(snapshot.vertices[0].x, 2.0);
//! assert_eq!(snapshot.segment_count, 2);
//! assert_eq!(snapshot.active_indices(), &[0, 1, 1, 2]);
//! ```

use glam::{Vec3, Vec4};

use crate::error::ConfigError;

/// A display-space position paired with its RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColoredPoint {
    pub position: Vec3,
    pub color: Vec4,
}

impl ColoredPoint {
    pub fn new(position: Vec3, color: Vec4) -> Self {
        Self { position, color }
    }
}

/// Linear view of the buffer, oldest point first.
///
/// `vertices` and `colors` hold exactly `count` entries. `indices` is the
/// full static line table; only the first `2 * segment_count` entries
/// describe segments between valid points.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub vertices: &'a [Vec3],
    pub colors: &'a [Vec4],
    pub indices: &'a [u32],
    pub segment_count: usize,
}

impl<'a> Snapshot<'a> {
    /// Index pairs for the segments between valid points.
    pub fn active_indices(&self) -> &'a [u32] {
        &self.indices[..self.segment_count * 2]
    }

    /// At least one segment exists. Nothing should be drawn otherwise.
    pub fn is_drawable(&self) -> bool {
        self.segment_count > 0
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Fixed-capacity ring of colored trajectory points.
///
/// Once full, every push overwrites the oldest point in place. Storage,
/// snapshot scratch space and the line index table are all allocated in
/// [`TrajectoryBuffer::new`]; nothing allocates afterwards.
#[derive(Debug, Clone)]
pub struct TrajectoryBuffer {
    positions: Vec<Vec3>,
    colors: Vec<Vec4>,
    /// Next slot to write. When full this is also the oldest point.
    head: usize,
    count: usize,
    indices: Vec<u32>,
    linear_positions: Vec<Vec3>,
    linear_colors: Vec<Vec4>,
}

impl TrajectoryBuffer {
    /// Allocate a ring for `capacity` points.
    ///
    /// Fails with [`ConfigError::InvalidCapacity`] when `capacity < 2`, since a
    /// single point cannot form a segment.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity < 2 || u32::try_from(capacity).is_err() {
            return Err(ConfigError::InvalidCapacity(capacity));
        }

        Ok(Self {
            positions: vec![Vec3::ZERO; capacity],
            colors: vec![Vec4::ZERO; capacity],
            head: 0,
            count: 0,
            indices: line_indices(capacity),
            linear_positions: vec![Vec3::ZERO; capacity],
            linear_colors: vec![Vec4::ZERO; capacity],
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    /// Number of points currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Slot the next push writes to.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Segments between the held points, `max(0, len - 1)`.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.count.saturating_sub(1)
    }

    /// The static line index table, `2 * (capacity - 1)` entries.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Append a point, evicting the oldest one when full.
    ///
    /// Non-finite positions are stored unchanged.
    #[inline]
    pub fn push(&mut self, point: ColoredPoint) {
        self.positions[self.head] = point.position;
        self.colors[self.head] = point.color;

        self.head = (self.head + 1) % self.capacity();
        if self.count < self.capacity() {
            self.count += 1;
        }
    }

    /// Drop every point. Capacity and index table are kept.
    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    /// Ring slot of the oldest held point.
    #[inline]
    fn oldest(&self) -> usize {
        (self.head + self.capacity() - self.count) % self.capacity()
    }

    /// Held points, oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ColoredPoint> + '_ {
        let start = self.oldest();
        let capacity = self.capacity();
        (0..self.count).map(move |i| {
            let idx = (start + i) % capacity;
            ColoredPoint::new(self.positions[idx], self.colors[idx])
        })
    }

    /// Copy the held points into linear order and return a drawable view.
    ///
    /// Costs `O(len)` copies and no allocation. The index table is shared,
    /// never rebuilt.
    pub fn snapshot(&mut self) -> Snapshot<'_> {
        let count = self.count;
        let start = self.oldest();
        let capacity = self.capacity();

        // Ring split into at most two contiguous runs
        let first_run = count.min(capacity - start);
        let second_run = count - first_run;

        self.linear_positions[..first_run]
            .copy_from_slice(&self.positions[start..start + first_run]);
        self.linear_colors[..first_run].copy_from_slice(&self.colors[start..start + first_run]);
        self.linear_positions[first_run..count].copy_from_slice(&self.positions[..second_run]);
        self.linear_colors[first_run..count].copy_from_slice(&self.colors[..second_run]);

        Snapshot {
            vertices: &self.linear_positions[..count],
            colors: &self.linear_colors[..count],
            indices: &self.indices,
            segment_count: count.saturating_sub(1),
        }
    }

    /// Mean of the held positions, or `fallback` when empty.
    pub fn centroid(&self, fallback: Vec3) -> Vec3 {
        if self.count == 0 {
            return fallback;
        }
        let sum = self.iter().fold(Vec3::ZERO, |acc, p| acc + p.position);
        sum / self.count as f32
    }
}

/// `{0,1},{1,2},...,{n-2,n-1}` flattened, for `n = capacity`.
fn line_indices(capacity: usize) -> Vec<u32> {
    (0..capacity as u32 - 1).flat_map(|i| [i, i + 1]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32) -> ColoredPoint {
        ColoredPoint::new(Vec3::new(x, 0.0, 0.0), Vec4::new(x, x, x, 1.0))
    }

    fn xs(snapshot: &Snapshot) -> Vec<f32> {
        snapshot.vertices.iter().map(|v| v.x).collect()
    }

    #[test]
    fn test_rejects_capacity_below_two() {
        assert!(matches!(TrajectoryBuffer::new(0), Err(ConfigError::InvalidCapacity(0))));
        assert!(matches!(TrajectoryBuffer::new(1), Err(ConfigError::InvalidCapacity(1))));
        assert!(TrajectoryBuffer::new(2).is_ok());
    }

    #[test]
    fn test_index_table_built_for_full_capacity() {
        let trail = TrajectoryBuffer::new(4).unwrap();
        assert_eq!(trail.indices(), &[0, 1, 1, 2, 2, 3]);
        assert_eq!(trail.indices().len(), 2 * (trail.capacity() - 1));
    }

    #[test]
    fn test_occupancy_saturates_at_capacity() {
        let mut trail = TrajectoryBuffer::new(5).unwrap();
        for k in 1..=12 {
            trail.push(point(k as f32));
            assert_eq!(trail.len(), k.min(5));
        }
        assert!(trail.is_full());
    }

    #[test]
    fn test_head_wraps() {
        let mut trail = TrajectoryBuffer::new(3).unwrap();
        assert_eq!(trail.head(), 0);
        trail.push(point(1.0));
        trail.push(point(2.0));
        assert_eq!(trail.head(), 2);
        trail.push(point(3.0));
        assert_eq!(trail.head(), 0);
        trail.push(point(4.0));
        assert_eq!(trail.head(), 1);
    }

    #[test]
    fn test_snapshot_before_wrap_keeps_push_order() {
        let mut trail = TrajectoryBuffer::new(8).unwrap();
        for x in [3.0, 1.0, 4.0, 1.0, 5.0] {
            trail.push(point(x));
        }
        let snapshot = trail.snapshot();
        assert_eq!(xs(&snapshot), vec![3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(snapshot.colors[2], Vec4::new(4.0, 4.0, 4.0, 1.0));
        assert_eq!(snapshot.segment_count, 4);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut trail = TrajectoryBuffer::new(3).unwrap();
        for x in 1..=3 {
            trail.push(point(x as f32));
        }
        trail.push(point(4.0));
        assert_eq!(trail.len(), 3);
        assert_eq!(xs(&trail.snapshot()), vec![2.0, 3.0, 4.0]);

        trail.push(point(5.0));
        trail.push(point(6.0));
        assert_eq!(xs(&trail.snapshot()), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_segment_count() {
        let mut trail = TrajectoryBuffer::new(4).unwrap();
        let snapshot = trail.snapshot();
        assert_eq!(snapshot.segment_count, 0);
        assert!(!snapshot.is_drawable());
        assert!(snapshot.is_empty());

        trail.push(point(0.0));
        let snapshot = trail.snapshot();
        assert_eq!(snapshot.segment_count, 0);
        assert!(snapshot.active_indices().is_empty());
        assert_eq!(snapshot.len(), 1);

        trail.push(point(1.0));
        let snapshot = trail.snapshot();
        assert_eq!(snapshot.segment_count, 1);
        assert!(snapshot.is_drawable());
        assert_eq!(snapshot.active_indices(), &[0, 1]);

        for x in 2..10 {
            trail.push(point(x as f32));
        }
        assert_eq!(trail.snapshot().segment_count, 3);
        assert_eq!(trail.segment_count(), 3);
    }

    #[test]
    fn test_snapshot_shares_index_table() {
        let mut trail = TrajectoryBuffer::new(6).unwrap();
        let table = trail.indices().as_ptr();
        for x in 0..20 {
            trail.push(point(x as f32));
            let snapshot = trail.snapshot();
            assert_eq!(snapshot.indices.as_ptr(), table);
            assert_eq!(snapshot.indices.len(), 10);
        }
    }

    #[test]
    fn test_centroid() {
        let mut trail = TrajectoryBuffer::new(4).unwrap();
        trail.push(ColoredPoint::new(Vec3::ZERO, Vec4::ONE));
        trail.push(ColoredPoint::new(Vec3::new(2.0, 0.0, 0.0), Vec4::ZERO));
        assert_eq!(trail.centroid(Vec3::splat(9.0)), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_centroid_ignores_evicted_points() {
        let mut trail = TrajectoryBuffer::new(2).unwrap();
        trail.push(point(100.0));
        trail.push(point(2.0));
        trail.push(point(4.0));
        assert_eq!(trail.centroid(Vec3::ZERO), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_centroid_empty_uses_fallback() {
        let trail = TrajectoryBuffer::new(3).unwrap();
        let anchor = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(trail.centroid(anchor), anchor);
    }

    #[test]
    fn test_clear_keeps_capacity_and_table() {
        let mut trail = TrajectoryBuffer::new(3).unwrap();
        for x in 0..5 {
            trail.push(point(x as f32));
        }
        trail.clear();
        assert!(trail.is_empty());
        assert_eq!(trail.capacity(), 3);
        assert_eq!(trail.indices(), &[0, 1, 1, 2]);

        trail.push(point(7.0));
        trail.push(point(8.0));
        assert_eq!(xs(&trail.snapshot()), vec![7.0, 8.0]);
    }

    #[test]
    fn test_non_finite_points_are_stored() {
        let mut trail = TrajectoryBuffer::new(3).unwrap();
        trail.push(point(1.0));
        trail.push(ColoredPoint::new(Vec3::splat(f32::NAN), Vec4::ONE));
        trail.push(ColoredPoint::new(Vec3::splat(f32::INFINITY), Vec4::ONE));

        assert_eq!(trail.len(), 3);
        let snapshot = trail.snapshot();
        assert!(snapshot.vertices[1].x.is_nan());
        assert!(snapshot.vertices[2].x.is_infinite());
        assert!(trail.centroid(Vec3::ZERO).x.is_nan());
    }

    #[test]
    fn test_iter_matches_snapshot() {
        let mut trail = TrajectoryBuffer::new(4).unwrap();
        for x in 0..7 {
            trail.push(point(x as f32));
        }
        let from_iter: Vec<f32> = trail.iter().map(|p| p.position.x).collect();
        assert_eq!(trail.iter().len(), 4);
        assert_eq!(from_iter, xs(&trail.snapshot()));
    }
}

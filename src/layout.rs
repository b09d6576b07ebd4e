//! Interval layout: proximity merge followed by greedy layering.
//!
//! Stage 1 drops near-duplicate intervals within each label group (first
//! seen wins). Stage 2 places every surviving interval, across all groups,
//! on the lowest-numbered layer where it overlaps nothing already placed.
//!
//! Placement follows processing order only. No sort by start coordinate is
//! done, so the packing is greedy rather than minimal.

use std::collections::BTreeMap;

/// Default merge tolerance, in genomic units.
pub const DEFAULT_TOLERANCE: f64 = 5.0;

/// A closed genomic interval `[start, stop]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: i64,
    pub stop: i64,
}

impl Interval {
    /// Creates an interval, swapping the bounds if they are given inverted.
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            start: a.min(b),
            stop: a.max(b),
        }
    }

    /// Strict disjointness: intervals sharing a boundary position overlap.
    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.stop < other.start || self.start > other.stop
    }

    /// True if both endpoints lie within `tolerance` of `other`'s.
    pub fn is_near(&self, other: &Interval, tolerance: f64) -> bool {
        self.start.abs_diff(other.start) as f64 <= tolerance
            && self.stop.abs_diff(other.stop) as f64 <= tolerance
    }

    pub fn len(&self) -> u64 {
        self.stop.abs_diff(self.start).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Returns the indices of the intervals kept after dropping near-duplicates.
///
/// Each interval is compared with every interval kept so far; it is dropped
/// if it is near one of them, and kept otherwise. Kept intervals are never
/// widened or averaged.
pub fn merge_close(intervals: &[Interval], tolerance: f64) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for (idx, interval) in intervals.iter().enumerate() {
        let duplicate = kept
            .iter()
            .any(|&k| interval.is_near(&intervals[k], tolerance));
        if !duplicate {
            kept.push(idx);
        }
    }
    kept
}

/// Layers of mutually disjoint intervals.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<Vec<Interval>>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `interval` on the first layer where it overlaps nothing,
    /// opening a new layer if none accepts it. Returns the layer index.
    pub fn place(&mut self, interval: Interval) -> usize {
        for (idx, layer) in self.layers.iter_mut().enumerate() {
            if layer.iter().all(|existing| interval.is_disjoint(existing)) {
                layer.push(interval);
                return idx;
            }
        }
        self.layers.push(vec![interval]);
        self.layers.len() - 1
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> Option<&[Interval]> {
        self.layers.get(index).map(Vec::as_slice)
    }
}

/// Assigns a layer to each interval, in iteration order.
pub fn assign_layers<I>(intervals: I) -> Vec<usize>
where
    I: IntoIterator<Item = Interval>,
{
    let mut stack = LayerStack::new();
    intervals.into_iter().map(|iv| stack.place(iv)).collect()
}

/// Result of a full layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Layer per input item, `None` for items merged away as near-duplicates
    pub layers: Vec<Option<usize>>,
    /// Input indices in the order they were placed
    pub placement_order: Vec<usize>,
    layer_count: usize,
}

impl Layout {
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn kept_count(&self) -> usize {
        self.placement_order.len()
    }

    pub fn merged_count(&self) -> usize {
        self.layers.len() - self.kept_count()
    }
}

/// Merges near-duplicates within each label group, then layers all survivors.
///
/// Groups are visited in ascending label order and items within a group in
/// input order; the layering consumes survivors in that same order.
pub fn layout<K: Ord>(items: &[(K, Interval)], tolerance: f64) -> Layout {
    let mut groups: BTreeMap<&K, Vec<usize>> = BTreeMap::new();
    for (idx, (key, _)) in items.iter().enumerate() {
        groups.entry(key).or_default().push(idx);
    }

    let mut placement_order = Vec::with_capacity(items.len());
    for members in groups.values() {
        let intervals: Vec<Interval> = members.iter().map(|&i| items[i].1).collect();
        placement_order.extend(merge_close(&intervals, tolerance).into_iter().map(|k| members[k]));
    }

    let mut layers = vec![None; items.len()];
    let mut stack = LayerStack::new();
    for &idx in &placement_order {
        layers[idx] = Some(stack.place(items[idx].1));
    }

    log::debug!(
        "Layout: {} intervals, {} kept, {} layers",
        items.len(),
        placement_order.len(),
        stack.layer_count()
    );

    Layout {
        layers,
        placement_order,
        layer_count: stack.layer_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i64, stop: i64) -> Interval {
        Interval::new(start, stop)
    }

    #[test]
    fn test_interval_disjoint_strict() {
        assert!(iv(10, 20).is_disjoint(&iv(21, 30)));
        assert!(iv(21, 30).is_disjoint(&iv(10, 20)));
        assert!(!iv(10, 20).is_disjoint(&iv(20, 30)));
        assert!(!iv(10, 20).is_disjoint(&iv(12, 15)));
    }

    #[test]
    fn test_interval_normalizes_inverted() {
        let inverted = iv(30, 10);
        assert_eq!(inverted.start, 10);
        assert_eq!(inverted.stop, 30);
        assert_eq!(inverted.len(), 21);
    }

    #[test]
    fn test_merge_within_tolerance() {
        let kept = merge_close(&[iv(100, 200), iv(102, 198)], 5.0);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn test_merge_outside_tolerance() {
        let kept = merge_close(&[iv(100, 200), iv(110, 200)], 5.0);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn test_merge_tolerance_inclusive() {
        let kept = merge_close(&[iv(100, 200), iv(105, 195)], 5.0);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn test_merge_compares_against_all_kept() {
        // Third interval is near the first kept one, not the second.
        let kept = merge_close(&[iv(100, 200), iv(300, 400), iv(103, 202)], 5.0);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn test_merge_first_seen_wins_without_chaining() {
        // 104 is near 100 and dropped; 108 is not near 100 and is kept,
        // even though it is near the dropped 104.
        let kept = merge_close(&[iv(100, 150), iv(104, 154), iv(108, 158)], 5.0);
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn test_layering_boundary() {
        assert_eq!(assign_layers([iv(10, 20), iv(21, 30)]), vec![0, 0]);
        assert_eq!(assign_layers([iv(10, 20), iv(20, 30)]), vec![0, 1]);
    }

    #[test]
    fn test_layering_reuses_lowest_layer() {
        let layers = assign_layers([iv(0, 10), iv(5, 15), iv(8, 12), iv(11, 20), iv(16, 30)]);
        assert_eq!(layers, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_layering_is_greedy_in_input_order() {
        let (a, b, c, d) = (iv(0, 2), iv(4, 6), iv(1, 3), iv(3, 5));
        assert_eq!(assign_layers([a, b, c, d]), vec![0, 0, 1, 2]);
        // The same intervals sorted by start pack into two layers.
        assert_eq!(assign_layers([a, c, d, b]), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_layer_members_are_pairwise_disjoint() {
        let intervals: Vec<Interval> = (0..40)
            .map(|i| iv((i * 7) % 50, (i * 7) % 50 + (i % 9) + 1))
            .collect();
        let mut stack = LayerStack::new();
        for &interval in &intervals {
            stack.place(interval);
        }
        for l in 0..stack.layer_count() {
            let members = stack.layer(l).unwrap();
            for (a, x) in members.iter().enumerate() {
                for y in &members[a + 1..] {
                    assert!(x.is_disjoint(y), "{:?} and {:?} share layer {}", x, y, l);
                }
            }
        }
    }

    #[test]
    fn test_layout_merges_per_group_only() {
        let items = vec![
            ("SP1", iv(100, 200)),
            ("GATA1", iv(101, 199)),
            ("SP1", iv(102, 198)),
        ];
        let result = layout(&items, 5.0);
        // SP1 duplicate dropped, GATA1 kept although near SP1.
        assert_eq!(result.layers[2], None);
        assert!(result.layers[0].is_some());
        assert!(result.layers[1].is_some());
        assert_eq!(result.kept_count(), 2);
        assert_eq!(result.merged_count(), 1);
        assert_eq!(result.layer_count(), 2);
    }

    #[test]
    fn test_layout_groups_in_label_order() {
        let items = vec![("ZNF", iv(0, 10)), ("AP1", iv(5, 15))];
        let result = layout(&items, 5.0);
        // AP1 is placed first and takes layer 0.
        assert_eq!(result.placement_order, vec![1, 0]);
        assert_eq!(result.layers, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_extreme_endpoints_do_not_overflow() {
        let wide = iv(i64::MIN, 0);
        let edge = iv(i64::MAX - 1, i64::MAX);
        assert_eq!(wide.len(), (1u64 << 63) + 1);
        assert_eq!(iv(i64::MIN, i64::MAX).len(), u64::MAX);
        assert!(!wide.is_near(&edge, 5.0));
        assert!(wide.is_near(&wide, 0.0));

        let items = vec![("SP1", wide), ("SP1", edge)];
        let result = layout(&items, 5.0);
        assert_eq!(result.layers, vec![Some(0), Some(0)]);
    }

    #[test]
    fn test_layout_empty() {
        let items: Vec<(String, Interval)> = Vec::new();
        let result = layout(&items, 5.0);
        assert!(result.layers.is_empty());
        assert_eq!(result.layer_count(), 0);
    }
}

//! Scroll-offset mapping between the two panes' coordinate spaces.
//!
//! Pure logic, no I/O. Blocks are paired strictly by ordinal position:
//! segment i of one pane maps to segment i of the other (the shorter
//! list's last segment absorbs the overflow). Within a segment, the
//! relative position is carried over as a height ratio.

/// One content block's vertical extent within its panel's scrollable
/// area, in rows. Ordered ascending by `top`; expected (not enforced) to
/// tile the scroll range without gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPosition {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl SegmentPosition {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self { id: id.into(), top, height }
    }
}

/// Map a scroll offset from `src`'s coordinate space into `dst`'s.
///
/// Returns `None` when either list is empty; the caller skips this
/// synchronization pass. Safe to call with stale or inconsistent lists;
/// the worst case is an imprecise but bounded result.
pub fn map_offset(
    source_top: f64,
    src: &[SegmentPosition],
    dst: &[SegmentPosition],
) -> Option<f64> {
    if src.is_empty() || dst.is_empty() {
        return None;
    }

    // Which segment is the scroll position in? Past the last segment
    // (overscroll) pins to the final one instead of failing.
    let idx = src
        .iter()
        .position(|seg| source_top < seg.top + seg.height)
        .unwrap_or(src.len() - 1);
    let src_seg = src.get(idx)?;

    // Offset within the segment, kept inside [0, height] so the ratio
    // stays in [0, 1] even against stale measurements.
    let mut inner = source_top - src_seg.top;
    if inner < 0.0 {
        inner = 0.0;
    }
    if inner > src_seg.height {
        inner = src_seg.height;
    }
    // 高さ 0 のセグメントは先頭位置に対応させる
    let ratio = if src_seg.height > 0.0 { inner / src_seg.height } else { 0.0 };

    let target = idx.min(dst.len() - 1);
    let dst_seg = &dst[target];

    Some(dst_seg.top + ratio * dst_seg.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(spans: &[(f64, f64)]) -> Vec<SegmentPosition> {
        spans
            .iter()
            .enumerate()
            .map(|(i, &(top, height))| SegmentPosition::new(format!("blk{i}"), top, height))
            .collect()
    }

    fn sample_pair() -> (Vec<SegmentPosition>, Vec<SegmentPosition>) {
        (
            segs(&[(0.0, 100.0), (100.0, 50.0)]),
            segs(&[(0.0, 200.0), (200.0, 100.0)]),
        )
    }

    #[test]
    fn maps_by_ordinal_and_ratio() {
        let (src, dst) = sample_pair();
        // Halfway into segment 0 (ratio 0.5) lands halfway into dst segment 0.
        assert_eq!(map_offset(50.0, &src, &dst), Some(100.0));
        // 20 rows into segment 1 (ratio 0.4) lands 40 rows into dst segment 1.
        assert_eq!(map_offset(120.0, &src, &dst), Some(240.0));
    }

    #[test]
    fn overscroll_pins_to_last_segment() {
        let (src, dst) = sample_pair();
        // Way past the end: index clamps to 1, inner offset clamps to the
        // full height, so the result is the very end of dst.
        assert_eq!(map_offset(9999.0, &src, &dst), Some(300.0));
    }

    #[test]
    fn empty_lists_yield_none() {
        let (src, dst) = sample_pair();
        assert_eq!(map_offset(50.0, &[], &dst), None);
        assert_eq!(map_offset(50.0, &src, &[]), None);
        assert_eq!(map_offset(0.0, &[], &[]), None);
    }

    #[test]
    fn negative_offset_clamps_to_segment_start() {
        let (src, dst) = sample_pair();
        assert_eq!(map_offset(-25.0, &src, &dst), Some(0.0));
    }

    #[test]
    fn zero_height_segment_maps_to_its_start() {
        let src = segs(&[(0.0, 0.0), (0.0, 80.0)]);
        let dst = segs(&[(0.0, 40.0), (40.0, 40.0)]);
        assert_eq!(map_offset(0.0, &src, &dst), Some(0.0));
    }

    #[test]
    fn shorter_destination_absorbs_tail_segments() {
        let src = segs(&[(0.0, 10.0), (10.0, 10.0), (20.0, 10.0)]);
        let dst = segs(&[(0.0, 30.0), (30.0, 30.0)]);
        // src segment 2 pairs with dst segment 1 (the last one).
        assert_eq!(map_offset(25.0, &src, &dst), Some(45.0));
    }

    #[test]
    fn result_stays_within_destination_range() {
        let (src, dst) = sample_pair();
        let lo = dst[0].top;
        let hi = dst.last().unwrap().top + dst.last().unwrap().height;
        for i in -10..320 {
            let mapped = map_offset(f64::from(i), &src, &dst).unwrap();
            assert!(
                (lo..=hi).contains(&mapped),
                "offset {i} mapped to {mapped}, outside [{lo}, {hi}]"
            );
        }
    }

    #[test]
    fn mapping_is_monotonic() {
        let (src, dst) = sample_pair();
        let mut prev = f64::NEG_INFINITY;
        for i in 0..400 {
            let mapped = map_offset(f64::from(i) * 0.5, &src, &dst).unwrap();
            assert!(
                mapped >= prev,
                "mapping decreased at offset {}: {prev} -> {mapped}",
                f64::from(i) * 0.5
            );
            prev = mapped;
        }
    }
}

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tandem::sync::{SegmentPosition, map_offset};

#[derive(Arbitrary, Debug)]
struct Input {
    source_top: f64,
    src_heights: Vec<f64>,
    dst_heights: Vec<f64>,
}

/// Build a well-formed (tiling, ascending) segment list out of arbitrary
/// heights. Non-finite and negative heights are squashed to zero.
fn tile(heights: &[f64]) -> Vec<SegmentPosition> {
    let mut top = 0.0;
    let mut segs = Vec::new();
    for (i, &h) in heights.iter().take(64).enumerate() {
        let h = if h.is_finite() && h > 0.0 { h.min(1e9) } else { 0.0 };
        segs.push(SegmentPosition::new(format!("blk{i}"), top, h));
        top += h;
    }
    segs
}

fuzz_target!(|input: Input| {
    // Raw, possibly garbage lists: must not panic, whatever comes back.
    let raw_src: Vec<SegmentPosition> = input
        .src_heights
        .iter()
        .zip(&input.dst_heights)
        .enumerate()
        .map(|(i, (&a, &b))| SegmentPosition::new(format!("blk{i}"), a, b))
        .collect();
    let _ = map_offset(input.source_top, &raw_src, &raw_src);

    // Well-formed lists: the full contract has to hold.
    let src = tile(&input.src_heights);
    let dst = tile(&input.dst_heights);
    if !input.source_top.is_finite() {
        return;
    }

    let mapped = map_offset(input.source_top, &src, &dst);

    if src.is_empty() || dst.is_empty() {
        assert_eq!(mapped, None, "empty list must map to None");
        return;
    }

    let mapped = mapped.expect("non-empty lists must map");

    // Result stays inside the destination's extent.
    let lo = dst[0].top;
    let hi = dst.last().unwrap().top + dst.last().unwrap().height;
    assert!(
        mapped >= lo && mapped <= hi,
        "mapped {mapped} outside [{lo}, {hi}] for source_top {}",
        input.source_top,
    );

    // Monotonic in source_top, unless src is longer than dst, where the
    // overflow segments all re-enter the pinned last destination segment
    // at ratio 0 (the documented ordinal-pairing behavior).
    if src.len() <= dst.len() {
        let further = map_offset(input.source_top + 1.0, &src, &dst).unwrap();
        assert!(
            further >= mapped,
            "mapping decreased: {mapped} -> {further} at source_top {}",
            input.source_top,
        );
    }
});

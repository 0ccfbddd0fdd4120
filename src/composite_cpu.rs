//! CPU compositing over premultiplied RGBA8 buffers.

use crate::model::RevealDir;

/// `(a * b) / 255` with rounding, for 8-bit channel products.
#[inline]
fn mul_div255(a: u16, b: u16) -> u8 {
    let t = a * b + 128;
    ((t + (t >> 8)) >> 8) as u8
}

/// Premultiplied source-over: `dst = src + dst * (1 - src.a)`.
pub fn composite_over_in_place(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    debug_assert_eq!(dst.len() % 4, 0);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - sa;
        for i in 0..4 {
            d[i] = s[i].saturating_add(mul_div255(u16::from(d[i]), inv));
        }
    }
}

/// Directional wipe: composite `src` over `dst` weighted by a per-pixel
/// coverage that sweeps across the buffer as `t` goes from 0 to 1.
///
/// `soft_edge` is the width of the feathered edge as a fraction of the
/// swept axis; `0` gives a hard edge. At `t >= 1` this is plain over.
pub fn composite_reveal_in_place(
    dst: &mut [u8],
    src: &[u8],
    width: u32,
    height: u32,
    t: f32,
    dir: RevealDir,
    soft_edge: f32,
) {
    debug_assert_eq!(dst.len(), src.len());
    debug_assert_eq!(dst.len(), (width * height * 4) as usize);

    let t = t.clamp(0.0, 1.0);
    if t <= 0.0 {
        return;
    }
    if t >= 1.0 {
        composite_over_in_place(dst, src);
        return;
    }

    let soft = soft_edge.max(0.0);
    // The threshold overshoots by the edge width so full coverage is
    // reached everywhere exactly at t = 1.
    let threshold = t * (1.0 + soft);

    let coverage_at = |p: f32| -> f32 {
        if soft <= 0.0 {
            if p < threshold { 1.0 } else { 0.0 }
        } else {
            ((threshold - p) / soft).clamp(0.0, 1.0)
        }
    };

    for y in 0..height {
        let fy = (y as f32 + 0.5) / height as f32;
        let row = (y * width * 4) as usize;
        for x in 0..width {
            let fx = (x as f32 + 0.5) / width as f32;
            let p = match dir {
                RevealDir::LeftToRight => fx,
                RevealDir::RightToLeft => 1.0 - fx,
                RevealDir::TopToBottom => fy,
                RevealDir::BottomToTop => 1.0 - fy,
            };
            let cov = coverage_at(p);
            if cov <= 0.0 {
                continue;
            }

            let o = row + (x * 4) as usize;
            let cov_u16 = (cov * 255.0 + 0.5) as u16;
            let mut s = [0u8; 4];
            for i in 0..4 {
                s[i] = mul_div255(u16::from(src[o + i]), cov_u16);
            }
            let sa = u16::from(s[3]);
            if sa == 0 {
                continue;
            }
            let inv = 255 - sa;
            for i in 0..4 {
                dst[o + i] = s[i].saturating_add(mul_div255(u16::from(dst[o + i]), inv));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
        px.repeat((width * height) as usize)
    }

    #[test]
    fn over_opaque_src_replaces_dst() {
        let mut dst = solid(2, 2, [0, 0, 255, 255]);
        let src = solid(2, 2, [255, 0, 0, 255]);
        composite_over_in_place(&mut dst, &src);
        assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn over_transparent_src_keeps_dst() {
        let mut dst = solid(2, 2, [10, 20, 30, 255]);
        let src = solid(2, 2, [0, 0, 0, 0]);
        composite_over_in_place(&mut dst, &src);
        assert_eq!(&dst[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn over_half_alpha_blends() {
        let mut dst = solid(1, 1, [0, 0, 0, 255]);
        // Premultiplied 50% white.
        let src = solid(1, 1, [128, 128, 128, 128]);
        composite_over_in_place(&mut dst, &src);
        assert_eq!(dst[3], 255);
        assert!((125..=131).contains(&dst[0]));
    }

    #[test]
    fn reveal_zero_leaves_dst_untouched() {
        let mut dst = solid(4, 1, [0, 0, 0, 0]);
        let src = solid(4, 1, [255, 255, 255, 255]);
        composite_reveal_in_place(&mut dst, &src, 4, 1, 0.0, RevealDir::LeftToRight, 0.0);
        assert_eq!(dst, solid(4, 1, [0, 0, 0, 0]));
    }

    #[test]
    fn reveal_full_equals_over() {
        let mut dst = solid(4, 1, [0, 0, 0, 0]);
        let src = solid(4, 1, [255, 255, 255, 255]);
        composite_reveal_in_place(&mut dst, &src, 4, 1, 1.0, RevealDir::LeftToRight, 0.2);
        assert_eq!(dst, src);
    }

    #[test]
    fn reveal_half_hard_edge_covers_left_half_only() {
        let mut dst = solid(4, 1, [0, 0, 0, 0]);
        let src = solid(4, 1, [255, 255, 255, 255]);
        composite_reveal_in_place(&mut dst, &src, 4, 1, 0.5, RevealDir::LeftToRight, 0.0);
        assert_eq!(&dst[0..4], &[255, 255, 255, 255]);
        assert_eq!(&dst[4..8], &[255, 255, 255, 255]);
        assert_eq!(&dst[8..12], &[0, 0, 0, 0]);
        assert_eq!(&dst[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn reveal_right_to_left_covers_right_half_only() {
        let mut dst = solid(4, 1, [0, 0, 0, 0]);
        let src = solid(4, 1, [255, 255, 255, 255]);
        composite_reveal_in_place(&mut dst, &src, 4, 1, 0.5, RevealDir::RightToLeft, 0.0);
        assert_eq!(&dst[0..4], &[0, 0, 0, 0]);
        assert_eq!(&dst[12..16], &[255, 255, 255, 255]);
    }
}

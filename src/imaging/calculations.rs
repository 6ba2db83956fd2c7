//! Pure calculation functions for variant dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// A single responsive variant to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSize {
    pub width: u32,
    pub height: u32,
}

/// Scale a height to a target width, preserving aspect ratio.
pub fn scaled_height(original: (u32, u32), target_width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return 0;
    }
    let ratio = target_width as f64 / orig_w as f64;
    ((orig_h as f64 * ratio).round() as u32).max(1)
}

/// Decide which variant widths to produce for an original.
///
/// Widths above the original are dropped unless `allow_upscale` is set.
/// Duplicates are removed and the result is ascending. If every configured
/// width exceeds the original, the original width is the single variant.
pub fn variant_sizes(
    original: (u32, u32),
    widths: &[u32],
    allow_upscale: bool,
) -> Vec<VariantSize> {
    let (orig_w, _) = original;
    let mut targets: Vec<u32> = widths
        .iter()
        .copied()
        .filter(|&w| w > 0 && (allow_upscale || w <= orig_w))
        .collect();
    targets.sort_unstable();
    targets.dedup();

    if targets.is_empty() && orig_w > 0 {
        targets.push(orig_w);
    }

    targets
        .into_iter()
        .map(|width| VariantSize {
            width,
            height: scaled_height(original, width),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_larger_widths() {
        let sizes = variant_sizes((1000, 800), &[480, 960, 1440], false);
        let widths: Vec<u32> = sizes.iter().map(|s| s.width).collect();
        assert_eq!(widths, vec![480, 960]);
    }

    #[test]
    fn upscale_keeps_all_widths() {
        let sizes = variant_sizes((500, 400), &[480, 960], true);
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[1], VariantSize { width: 960, height: 768 });
    }

    #[test]
    fn heights_preserve_aspect() {
        let sizes = variant_sizes((2000, 1500), &[1000], false);
        assert_eq!(sizes[0], VariantSize { width: 1000, height: 750 });
    }

    #[test]
    fn falls_back_to_original_when_all_exceed() {
        let sizes = variant_sizes((300, 200), &[480, 960], false);
        assert_eq!(sizes, vec![VariantSize { width: 300, height: 200 }]);
    }

    #[test]
    fn sorts_and_dedups() {
        let sizes = variant_sizes((2000, 1000), &[960, 480, 960], false);
        let widths: Vec<u32> = sizes.iter().map(|s| s.width).collect();
        assert_eq!(widths, vec![480, 960]);
    }

    #[test]
    fn zero_width_original() {
        assert!(variant_sizes((0, 0), &[480], false).is_empty());
    }
}

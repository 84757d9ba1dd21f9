//! Index arithmetic for skip, paragraph jump and seek.
//!
//! A missing cursor (nothing played yet) is treated as sentence 0 throughout.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
}

/// Clamp a possibly out-of-range index into `[0, len - 1]`. `None` when
/// there are no sentences.
pub fn clamp_index(index: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len.saturating_sub(1) as i64;
    Some(index.clamp(0, last) as usize)
}

/// Target for a one-sentence skip, clamped at both ends.
pub fn skip_target(cursor: Option<usize>, direction: Direction, len: usize) -> Option<usize> {
    let current = cursor.unwrap_or(0) as i64;
    let delta = match direction {
        Direction::Forward => 1,
        Direction::Back => -1,
    };
    clamp_index(current + delta, len)
}

/// Closest paragraph start strictly after (forward) or strictly before (back)
/// the cursor. Forward falls back to the last sentence, back to sentence 0.
pub fn nearest_paragraph_boundary(
    boundaries: &[usize],
    len: usize,
    direction: Direction,
    cursor: Option<usize>,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = cursor.unwrap_or(0);
    let target = match direction {
        Direction::Forward => boundaries
            .iter()
            .copied()
            .find(|start| *start > current)
            .unwrap_or(len - 1),
        Direction::Back => boundaries
            .iter()
            .rev()
            .copied()
            .find(|start| *start < current)
            .unwrap_or(0),
    };
    Some(target.min(len - 1))
}

/// Sentence under a progress-bar position given as a fraction of its width.
pub fn fraction_to_index(fraction: f64, len: usize) -> Option<usize> {
    if !fraction.is_finite() {
        return None;
    }
    let raw = (fraction * len as f64).floor();
    // `as` saturates, so huge fractions still land on the last sentence.
    clamp_index(raw as i64, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_both_ends() {
        assert_eq!(clamp_index(-4, 3), Some(0));
        assert_eq!(clamp_index(1, 3), Some(1));
        assert_eq!(clamp_index(99, 3), Some(2));
        assert_eq!(clamp_index(0, 0), None);
    }

    #[test]
    fn skip_clamps_at_boundaries() {
        assert_eq!(skip_target(Some(2), Direction::Forward, 3), Some(2));
        assert_eq!(skip_target(Some(0), Direction::Back, 3), Some(0));
        assert_eq!(skip_target(None, Direction::Forward, 3), Some(1));
        assert_eq!(skip_target(None, Direction::Back, 3), Some(0));
    }

    #[test]
    fn paragraph_forward_lands_on_next_start() {
        let boundaries = [0, 3, 5];
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 8, Direction::Forward, Some(1)),
            Some(3)
        );
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 8, Direction::Forward, Some(3)),
            Some(5)
        );
    }

    #[test]
    fn paragraph_forward_in_last_paragraph_goes_to_last_sentence() {
        let boundaries = [0, 3, 5];
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 8, Direction::Forward, Some(6)),
            Some(7)
        );
    }

    #[test]
    fn paragraph_back_is_strictly_before_cursor() {
        let boundaries = [0, 3, 5];
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 8, Direction::Back, Some(5)),
            Some(3)
        );
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 8, Direction::Back, Some(4)),
            Some(3)
        );
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 8, Direction::Back, Some(0)),
            Some(0)
        );
    }

    #[test]
    fn missing_cursor_counts_as_zero() {
        let boundaries = [0, 2];
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 3, Direction::Forward, None),
            Some(2)
        );
        assert_eq!(
            nearest_paragraph_boundary(&boundaries, 3, Direction::Back, None),
            Some(0)
        );
    }

    #[test]
    fn fractions_map_to_clamped_indices() {
        assert_eq!(fraction_to_index(0.0, 10), Some(0));
        assert_eq!(fraction_to_index(0.55, 10), Some(5));
        assert_eq!(fraction_to_index(1.0, 10), Some(9));
        assert_eq!(fraction_to_index(-0.2, 10), Some(0));
        assert_eq!(fraction_to_index(f64::NAN, 10), None);
    }
}

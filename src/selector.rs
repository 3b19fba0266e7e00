use crate::bitmap::ReqBitmap;

/// Single-winner selection over a candidate vector. Implementations must be
/// pure: the same candidates always select the same lane.
pub trait PrioritySelector {
    fn select<const N: usize>(&self, candidates: ReqBitmap<N>) -> Option<usize>;
}

/// Fixed-priority selector: the lowest lane wins.
#[derive(Debug, Default, Copy, Clone)]
pub struct FixedPriority;

impl PrioritySelector for FixedPriority {
    fn select<const N: usize>(&self, candidates: ReqBitmap<N>) -> Option<usize> {
        candidates.lowest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_wins_test() {
        let s = FixedPriority;
        assert_eq!(s.select(ReqBitmap::<4>::from_bits(0b1010)), Some(1));
        assert_eq!(s.select(ReqBitmap::<4>::from_bits(0b1000)), Some(3));
        assert_eq!(s.select(ReqBitmap::<4>::full()), Some(0));
        assert_eq!(s.select(ReqBitmap::<4>::empty()), None);
    }

    #[test]
    fn exhaustive_test() {
        let s = FixedPriority;
        for bits in 1u64..16 {
            let id = s.select(ReqBitmap::<4>::from_bits(bits)).unwrap();
            assert!(bits & (1 << id) != 0);
            assert_eq!(bits & ((1 << id) - 1), 0);
        }
    }
}

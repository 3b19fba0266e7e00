use super::*;
use crate::bitmap::ReqBitmap;

/// Outcome of a grant as seen by the rotation: who was served and the
/// committed deficit it is left with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Granted {
    pub id: usize,
    pub deficit: Credit,
    pub packet_size: Credit,
}

impl Granted {
    pub fn exhausted(&self) -> bool {
        self.deficit < self.packet_size
    }
}

/// Round-robin eligibility mask. Lanes `head..N` are set; after reset the
/// whole vector is set and `head` is 0.
#[derive(Debug, Clone)]
pub struct RotationMask<const N: usize> {
    mask: ReqBitmap<N>,
}

impl<const N: usize> RotationMask<N> {
    pub fn new() -> Self {
        RotationMask {
            mask: ReqBitmap::full(),
        }
    }

    pub fn reset(&mut self) {
        self.mask = ReqBitmap::full();
    }

    pub fn mask(&self) -> ReqBitmap<N> {
        self.mask
    }

    pub fn head(&self) -> usize {
        self.mask.lowest().unwrap_or(0)
    }

    /// Mask with lanes `0..head` cleared. `head == N` wraps to the full mask.
    pub fn pattern(head: usize) -> ReqBitmap<N> {
        if head >= N {
            ReqBitmap::full()
        } else {
            ReqBitmap::from_bits(ReqBitmap::<N>::full().bits() & !((1u64 << head) - 1))
        }
    }

    pub fn is_canonical(mask: ReqBitmap<N>) -> bool {
        (0..N).any(|head| Self::pattern(head) == mask)
    }

    /// HEAD moves past an exhausted requester and stays on one that can
    /// still pay for another packet.
    pub fn next(&self, granted: Option<Granted>) -> ReqBitmap<N> {
        match granted {
            Some(g) if g.exhausted() => Self::pattern(g.id + 1),
            Some(g) => Self::pattern(g.id),
            None => self.mask,
        }
    }

    pub fn commit(&mut self, next: ReqBitmap<N>) {
        debug_assert!(Self::is_canonical(next), "non canonical mask {:?}", next);
        tracing::debug!(target: "drr-rotation", "mask {} -> {}", self.mask, next);
        self.mask = next;
    }
}

impl<const N: usize> Default for RotationMask<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Rot = RotationMask<REQS>;

    fn granted(id: usize, deficit: Credit) -> Option<Granted> {
        Some(Granted {
            id,
            deficit,
            packet_size: 300,
        })
    }

    #[test]
    fn patterns_test() {
        let p = (0..=REQS).map(|h| Rot::pattern(h).to_string()).collect::<Vec<_>>();
        assert_eq!(p, vec!["1111", "1110", "1100", "1000", "1111"]);
        assert!(Rot::is_canonical(ReqBitmap::from_bits(0b1100)));
        assert!(!Rot::is_canonical(ReqBitmap::from_bits(0b0110)));
        assert!(!Rot::is_canonical(ReqBitmap::empty()));
        assert_eq!(RotationMask::<64>::pattern(63).bits(), 1u64 << 63);
    }

    #[test]
    fn advance_hold_test() {
        let mut r = Rot::new();
        assert_eq!(r.head(), 0);
        assert_eq!(r.next(granted(0, 300)), ReqBitmap::full());
        assert_eq!(r.next(granted(0, 0)).bits(), 0b1110);
        r.commit(r.next(granted(1, 299)));
        assert_eq!(r.head(), 2);
        assert_eq!(r.next(granted(2, 600)).bits(), 0b1100);
        assert_eq!(r.next(granted(2, 0)).bits(), 0b1000);
        // exhausting the last lane wraps
        assert_eq!(r.next(granted(3, 0)), ReqBitmap::full());
        assert_eq!(r.next(granted(3, 300)).bits(), 0b1000);
        // a fallback grant below HEAD rewinds the rotation
        assert_eq!(r.next(granted(0, 300)), ReqBitmap::full());
    }

    #[test]
    fn no_grant_hold_test() {
        let mut r = Rot::new();
        r.commit(Rot::pattern(3));
        assert_eq!(r.next(None), Rot::pattern(3));
        r.reset();
        assert_eq!(r.mask(), ReqBitmap::full());
    }
}

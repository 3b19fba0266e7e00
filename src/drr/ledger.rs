use super::*;
use crate::bitmap::ReqBitmap;

/// Per-requester deficit counters and the credit rules that read them.
///
/// Every query works on the current counters only; the next counter values
/// are returned to the caller and become visible through [`CreditLedger::commit`].
#[derive(Debug, Clone)]
pub struct CreditLedger<const N: usize> {
    config: DrrConfig<N>,
    deficit: [Credit; N],
}

impl<const N: usize> CreditLedger<N> {
    pub fn new(config: DrrConfig<N>) -> Self {
        CreditLedger {
            config,
            deficit: [0; N],
        }
    }

    pub fn reset(&mut self) {
        self.deficit = [0; N];
    }

    pub fn config(&self) -> &DrrConfig<N> {
        &self.config
    }

    pub fn deficit(&self, id: usize) -> Credit {
        self.deficit[id]
    }

    pub fn deficits(&self) -> &[Credit; N] {
        &self.deficit
    }

    fn short(&self, id: usize) -> bool {
        self.deficit[id] < self.config.requester(id).packet_size
    }

    /// Deficit after one quantum, saturated at the cap.
    fn topped(&self, id: usize) -> Credit {
        let r = self.config.requester(id);
        let sum = u64::from(self.deficit[id]) + u64::from(r.quantum);
        // bounded by deficit_cap, which is a Credit
        sum.min(u64::from(r.deficit_cap)) as Credit
    }

    /// Requests that can be served this tick. A requester short on credit
    /// only qualifies when it is outside the rotation mask and a single
    /// quantum would cover its packet.
    pub fn eligibility(&self, request: ReqBitmap<N>, mask: ReqBitmap<N>) -> ReqBitmap<N> {
        let mut valid = ReqBitmap::empty();
        for id in request.iter_ones() {
            let packet_size = self.config.requester(id).packet_size;
            let ok = !self.short(id) || (!mask.bit(id) && self.topped(id) >= packet_size);
            valid.set(id, ok);
        }
        tracing::debug!(target: "drr-ledger", "req {} deficit {:?} mask {} -> valid {}", request, self.deficit, mask, valid);
        valid
    }

    /// Counter values for the next tick.
    ///
    /// `round_start` is set when the grant did not come out of the masked
    /// pass (fallback grant or no grant at all); every other requester that
    /// is still asking and short on credit then receives its quantum.
    pub fn next_deficits(
        &self,
        request: ReqBitmap<N>,
        grant: Option<usize>,
        round_start: bool,
    ) -> [Credit; N] {
        array_init::array_init(|id| {
            let packet_size = self.config.requester(id).packet_size;
            if grant == Some(id) {
                if self.short(id) {
                    self.topped(id).saturating_sub(packet_size)
                } else {
                    self.deficit[id] - packet_size
                }
            } else if round_start && request.bit(id) && self.short(id) {
                self.topped(id)
            } else {
                self.deficit[id]
            }
        })
    }

    pub fn commit(&mut self, next: [Credit; N]) {
        debug_assert!(
            next.iter()
                .zip(self.config.requesters())
                .all(|(d, r)| *d <= r.deficit_cap)
        );
        self.deficit = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(s: &str) -> ReqBitmap<REQS> {
        s.parse().unwrap()
    }

    fn ledger(deficit: [Credit; REQS]) -> CreditLedger<REQS> {
        let mut l = CreditLedger::new(DrrConfig::reference());
        l.commit(deficit);
        l
    }

    #[test]
    fn eligibility_test() {
        let l = ledger([0, 0, 0, 0]);
        // inside the mask nobody may top up
        assert_eq!(l.eligibility(bm("1111"), bm("1111")), bm("0000"));
        // outside the mask one quantum covers 0, 1 and 3 but not 2 (600 < 900)
        assert_eq!(l.eligibility(bm("1111"), bm("0000")), bm("1011"));
        assert_eq!(l.eligibility(bm("0001"), bm("0000")), bm("0001"));

        let l = ledger([300, 599, 900, 300]);
        assert_eq!(l.eligibility(bm("1111"), bm("1111")), bm("1101"));
        assert_eq!(l.eligibility(bm("0110"), bm("1111")), bm("0100"));
        assert_eq!(l.eligibility(bm("0000"), bm("0000")), bm("0000"));
    }

    #[test]
    fn two_quanta_test() {
        // requester 2 needs 900 but a top up from 0 only reaches 600
        let l = ledger([0, 0, 300, 0]);
        assert_eq!(l.eligibility(bm("0100"), bm("0000")), bm("0100"));
        let l = ledger([0, 0, 299, 0]);
        assert_eq!(l.eligibility(bm("0100"), bm("0000")), bm("0000"));
    }

    #[test]
    fn grant_deduct_test() {
        let l = ledger([600, 0, 0, 0]);
        assert_eq!(l.next_deficits(bm("0001"), Some(0), false), [300, 0, 0, 0]);
        // first grant of a round charges the topped up value
        let l = ledger([0, 0, 300, 0]);
        assert_eq!(l.next_deficits(bm("0100"), Some(2), true), [0, 0, 0, 0]);
        // the top up saturates at the cap before the charge
        let l = ledger([100, 0, 0, 0]);
        assert_eq!(l.next_deficits(bm("0001"), Some(0), true), [300, 0, 0, 0]);
    }

    #[test]
    fn round_start_topup_test() {
        let l = ledger([0, 0, 900, 100]);
        // masked grant: nobody else is topped up
        assert_eq!(
            l.next_deficits(bm("1111"), Some(2), false),
            [0, 0, 0, 100]
        );
        // fallback grant: short requesters still asking get a quantum
        assert_eq!(
            l.next_deficits(bm("1011"), Some(0), true),
            [300, 600, 900, 300]
        );
        // no grant: same rule, idle requesters untouched
        let l = ledger([0, 0, 800, 100]);
        assert_eq!(
            l.next_deficits(bm("1110"), None, true),
            [0, 600, 1200, 300]
        );
        assert_eq!(l.next_deficits(bm("0000"), None, true), [0, 0, 800, 100]);
    }

    #[test]
    fn saturation_test() {
        let cfg = DrrConfig::new([Credit::MAX], [Credit::MAX], [Credit::MAX]).unwrap();
        let mut l = CreditLedger::new(cfg);
        l.commit([Credit::MAX - 1]);
        let req = ReqBitmap::<1>::full();
        assert_eq!(l.next_deficits(req, None, true), [Credit::MAX]);
        assert_eq!(l.eligibility(req, ReqBitmap::empty()), req);
        assert_eq!(l.next_deficits(req, Some(0), true), [0]);
    }

    #[test]
    fn reset_test() {
        let mut l = ledger([300, 600, 900, 300]);
        l.reset();
        assert_eq!(l.deficits(), &[0; REQS]);
    }
}

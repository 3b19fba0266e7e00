use crate::bitmap::ReqBitmap;
use crate::drr::{DrrArbiter, GrantPass, TickReport};
use crate::selector::PrioritySelector;

/// Request stimulus, sampled once per tick.
pub trait RequestSource<const N: usize> {
    fn requests(&mut self, tick: u64) -> ReqBitmap<N>;
}

impl<const N: usize, F: FnMut(u64) -> ReqBitmap<N>> RequestSource<N> for F {
    fn requests(&mut self, tick: u64) -> ReqBitmap<N> {
        self(tick)
    }
}

/// The same requests every tick.
pub struct Constant<const N: usize>(pub ReqBitmap<N>);

impl<const N: usize> RequestSource<N> for Constant<N> {
    fn requests(&mut self, _: u64) -> ReqBitmap<N> {
        self.0
    }
}

/// Cycles through a list of request vectors. An empty list never requests.
pub struct Pattern<const N: usize>(Vec<ReqBitmap<N>>);

impl<const N: usize> Pattern<N> {
    pub fn new(seq: Vec<ReqBitmap<N>>) -> Self {
        Pattern(seq)
    }
}

impl<const N: usize> RequestSource<N> for Pattern<N> {
    fn requests(&mut self, tick: u64) -> ReqBitmap<N> {
        if self.0.is_empty() {
            ReqBitmap::empty()
        } else {
            self.0[(tick % self.0.len() as u64) as usize]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantStats<const N: usize> {
    pub ticks: u64,
    pub grants: [u64; N],
    pub bytes: [u64; N],
    pub no_grant: u64,
    pub fallback: u64,
}

impl<const N: usize> GrantStats<N> {
    pub fn new() -> Self {
        GrantStats {
            ticks: 0,
            grants: [0; N],
            bytes: [0; N],
            no_grant: 0,
            fallback: 0,
        }
    }

    fn record(&mut self, report: &TickReport<N>, packet_size: impl Fn(usize) -> u32) {
        self.ticks += 1;
        match report.granted {
            Some(id) => {
                self.grants[id] += 1;
                self.bytes[id] += u64::from(packet_size(id));
                if report.pass == Some(GrantPass::Fallback) {
                    self.fallback += 1;
                }
            }
            None => self.no_grant += 1,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes.iter().sum()
    }

    /// Fraction of all granted bytes that went to `id`.
    pub fn share(&self, id: usize) -> f64 {
        match self.total_bytes() {
            0 => 0.0,
            total => self.bytes[id] as f64 / total as f64,
        }
    }
}

impl<const N: usize> Default for GrantStats<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-running test bench: clocks an arbiter from a [`RequestSource`].
pub struct Simulator<const N: usize, S: PrioritySelector> {
    arbiter: DrrArbiter<N, S>,
    stats: GrantStats<N>,
    trace: Option<Vec<TickReport<N>>>,
}

impl<const N: usize, S: PrioritySelector> Simulator<N, S> {
    pub fn new(arbiter: DrrArbiter<N, S>) -> Self {
        Simulator {
            arbiter,
            stats: GrantStats::new(),
            trace: None,
        }
    }

    /// Keep every [`TickReport`].
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(vec![]);
        self
    }

    pub fn run<R: RequestSource<N>>(&mut self, source: &mut R, ticks: u64) -> &GrantStats<N> {
        for _ in 0..ticks {
            let req = source.requests(self.arbiter.ticks());
            let report = self.arbiter.step_report(req);
            let config = self.arbiter.config();
            self.stats
                .record(&report, |id| config.requester(id).packet_size);
            if let Some(trace) = self.trace.as_mut() {
                trace.push(report);
            }
        }
        &self.stats
    }

    /// Reset the arbiter and drop collected statistics.
    pub fn reset(&mut self) {
        self.arbiter.reset();
        self.stats = GrantStats::new();
        if let Some(trace) = self.trace.as_mut() {
            trace.clear();
        }
    }

    pub fn stats(&self) -> &GrantStats<N> {
        &self.stats
    }

    pub fn trace(&self) -> &[TickReport<N>] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn arbiter(&self) -> &DrrArbiter<N, S> {
        &self.arbiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drr::REQS;

    fn bm(s: &str) -> ReqBitmap<REQS> {
        s.parse().unwrap()
    }

    #[test_log::test]
    fn reference_share_test() {
        // after the warm up tick the reference config repeats every 17 ticks
        let mut sim = Simulator::new(DrrArbiter::reference());
        let stats = sim.run(&mut Constant(ReqBitmap::full()), 1 + 17 * 10).clone();
        assert_eq!(stats.bytes, [18000, 18000, 18000, 9000]);
        assert_eq!(stats.grants, [60, 30, 20, 30]);
        assert_eq!(stats.no_grant, 1 + 3 * 10);
        assert_eq!(stats.fallback, 0);
        assert_eq!(stats.ticks, 171);
        // granted bytes follow quantum 600:600:600:300
        assert!((stats.share(3) - 1.0 / 7.0).abs() < 1e-9);
        assert!((stats.share(2) - 2.0 / 7.0).abs() < 1e-9);
        assert_eq!(sim.arbiter().deficits(), &[600, 600, 600, 300]);
    }

    #[test]
    fn pattern_test() {
        let mut p = Pattern::new(vec![bm("0001"), bm("1000")]);
        assert_eq!(p.requests(0), bm("0001"));
        assert_eq!(p.requests(3), bm("1000"));
        assert_eq!(Pattern::<REQS>::new(vec![]).requests(5), bm("0000"));
    }

    #[test]
    fn trace_test() {
        let mut sim = Simulator::new(DrrArbiter::reference()).with_trace();
        let mut src = |tick: u64| if tick % 2 == 0 { bm("0001") } else { bm("0000") };
        sim.run(&mut src, 6);
        let grants = sim.trace().iter().map(|r| r.granted).collect::<Vec<_>>();
        assert_eq!(grants, vec![None, None, Some(0), None, Some(0), None]);
        assert_eq!(sim.stats().no_grant, 4);
        assert_eq!(sim.trace()[4].tick, 4);
        sim.reset();
        assert!(sim.trace().is_empty());
        assert_eq!(sim.stats(), &GrantStats::new());
        assert_eq!(sim.arbiter().ticks(), 0);
    }
}

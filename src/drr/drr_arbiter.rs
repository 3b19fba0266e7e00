use super::ledger::CreditLedger;
use super::rotation::{Granted, RotationMask};
use super::*;
use crate::arbiter::Arbiter;
use crate::bitmap::ReqBitmap;
use crate::logger;
use crate::selector::{FixedPriority, PrioritySelector};

/// Which selection pass produced a grant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GrantPass {
    Masked,
    Fallback,
}

/// Everything one tick decided, including the state it committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport<const N: usize> {
    pub tick: u64,
    pub request: ReqBitmap<N>,
    pub valid: ReqBitmap<N>,
    pub masked_valid: ReqBitmap<N>,
    pub grant: ReqBitmap<N>,
    pub granted: Option<usize>,
    pub pass: Option<GrantPass>,
    pub deficits: [Credit; N],
    pub mask: ReqBitmap<N>,
}

pub struct DrrArbiter<const N: usize, S: PrioritySelector = FixedPriority> {
    ledger: CreditLedger<N>,
    rotation: RotationMask<N>,
    selector: S,
    tick: u64,
}

impl<const N: usize> DrrArbiter<N> {
    pub fn new(
        quantum: [Credit; N],
        packet_size: [Credit; N],
        deficit_cap: [Credit; N],
    ) -> Result<Self> {
        Ok(Self::with_config(DrrConfig::new(
            quantum,
            packet_size,
            deficit_cap,
        )?))
    }

    pub fn with_config(config: DrrConfig<N>) -> Self {
        Self::with_selector(config, FixedPriority)
    }
}

impl DrrArbiter<REQS> {
    pub fn reference() -> Self {
        Self::with_config(DrrConfig::reference())
    }
}

impl<const N: usize, S: PrioritySelector> DrrArbiter<N, S> {
    pub fn with_selector(config: DrrConfig<N>, selector: S) -> Self {
        tracing::event!(
            target: STATICS_TAR,
            logger::STATICS_CFG_LEVEL,
            name = "drr config",
            requesters = N,
            config = ?config
        );
        DrrArbiter {
            ledger: CreditLedger::new(config),
            rotation: RotationMask::new(),
            selector,
            tick: 0,
        }
    }

    pub fn config(&self) -> &DrrConfig<N> {
        self.ledger.config()
    }

    pub fn deficit(&self, id: usize) -> Credit {
        self.ledger.deficit(id)
    }

    pub fn deficits(&self) -> &[Credit; N] {
        self.ledger.deficits()
    }

    pub fn mask(&self) -> ReqBitmap<N> {
        self.rotation.mask()
    }

    pub fn head(&self) -> usize {
        self.rotation.head()
    }

    /// Ticks since construction or the last reset.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
        self.rotation.reset();
        self.tick = 0;
        tracing::event!(target: STATICS_TAR, logger::STATICS_CFG_LEVEL, name = "drr reset");
    }

    /// Grant vector for `request`, with zero or one lane set.
    pub fn step(&mut self, request: ReqBitmap<N>) -> ReqBitmap<N> {
        self.step_report(request).grant
    }

    pub fn step_report(&mut self, request: ReqBitmap<N>) -> TickReport<N> {
        let span = tracing::span!(
            target: STATICS_TAR,
            logger::STATICS_LEVEL,
            "drr tick",
            tick = self.tick
        );
        let _enter = span.enter();
        let report = self.evaluate(request);
        self.ledger.commit(report.deficits);
        self.rotation.commit(report.mask);
        self.tick += 1;
        match report.granted {
            Some(id) => tracing::event!(
                target: STATICS_TAR,
                logger::STATICS_LEVEL,
                name = "grant",
                id = id,
                pass = ?report.pass,
                size = self.config().requester(id).packet_size,
                deficit = report.deficits[id]
            ),
            None => tracing::event!(
                target: STATICS_TAR,
                logger::STATICS_LEVEL,
                name = "no grant",
                request = %request
            ),
        }
        report
    }

    /// Decide a tick from the committed state without touching it.
    fn evaluate(&self, request: ReqBitmap<N>) -> TickReport<N> {
        let mask = self.rotation.mask();
        let valid = self.ledger.eligibility(request, mask);
        let masked_valid = valid & mask;
        let fallback = self.selector.select(valid);
        let masked = self.selector.select(masked_valid);
        let (granted, pass) = if !masked_valid.is_empty() {
            (masked, Some(GrantPass::Masked))
        } else {
            (fallback, fallback.map(|_| GrantPass::Fallback))
        };
        let deficits = self
            .ledger
            .next_deficits(request, granted, masked_valid.is_empty());
        let next_mask = self.rotation.next(granted.map(|id| Granted {
            id,
            deficit: deficits[id],
            packet_size: self.config().requester(id).packet_size,
        }));
        TickReport {
            tick: self.tick,
            request,
            valid,
            masked_valid,
            grant: granted.map_or(ReqBitmap::empty(), ReqBitmap::one_hot),
            granted,
            pass,
            deficits,
            mask: next_mask,
        }
    }
}

impl<const N: usize, S: PrioritySelector> Arbiter for DrrArbiter<N, S> {
    fn arbit<T: Clone>(&mut self, req: &[Option<T>]) -> Option<(usize, T)> {
        self.step(ReqBitmap::from_slots(req))
            .lowest()
            .and_then(|id| req[id].clone().map(|d| (id, d)))
    }
}

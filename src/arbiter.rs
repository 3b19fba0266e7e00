/// Picks one of the pending slots and hands back its index and payload.
/// Arbiters are stateful: each call is one arbitration cycle.
pub trait Arbiter {
    fn arbit<T: Clone>(&mut self, req: &[Option<T>]) -> Option<(usize, T)>;
}

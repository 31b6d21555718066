use std::time::{Duration, Instant};

/// Cooperative per-frame time allowance for non-forced mesh rebuilds.
#[derive(Clone, Copy, Debug)]
pub struct MeshBudget {
    limit: Duration,
    spent: Duration,
    built: u32,
}

impl MeshBudget {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            spent: Duration::ZERO,
            built: 0,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Forced builds always start; others only while time remains.
    #[inline]
    pub fn can_start(&self, force: bool) -> bool {
        force || self.spent < self.limit
    }

    /// Runs `f` and charges its wall time.
    pub fn run<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let t0 = Instant::now();
        let out = f();
        self.charge(t0.elapsed());
        out
    }

    #[inline]
    pub fn charge(&mut self, d: Duration) {
        self.spent += d;
        self.built += 1;
    }

    pub fn reset(&mut self) {
        self.spent = Duration::ZERO;
        self.built = 0;
    }

    #[inline]
    pub fn spent(&self) -> Duration {
        self.spent
    }

    #[inline]
    pub fn built(&self) -> u32 {
        self.built
    }
}

impl Default for MeshBudget {
    fn default() -> Self {
        Self::from_millis(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_budget_still_allows_forced() {
        let mut b = MeshBudget::from_millis(10);
        assert!(b.can_start(false));
        b.charge(Duration::from_millis(11));
        assert!(!b.can_start(false));
        assert!(b.can_start(true));
        b.reset();
        assert!(b.can_start(false));
        assert_eq!(b.built(), 0);
    }
}

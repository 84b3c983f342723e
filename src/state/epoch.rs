/// Generation counter for race-prone fetches.
///
/// Every request takes a ticket when issued; its completion may only mutate
/// state if the ticket is still the latest one. Last-issued wins, not
/// last-arrived.
#[derive(Debug, Default)]
pub struct EpochGate {
    current: u64,
}

/// Generation token captured at issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl EpochGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation; every earlier ticket becomes stale.
    pub fn issue(&mut self) -> Epoch {
        self.current += 1;
        Epoch(self.current)
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current == epoch.0
    }

    pub fn current(&self) -> u64 {
        self.current
    }
}

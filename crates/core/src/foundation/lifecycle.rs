use std::fmt;

/// Bootstrapper lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Idle,
    Gating,
    Ordering,
    Registering,
    Booting,
    Ready,
    Failed,
}

impl BootState {
    /// `Ready` and `Failed` end a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootState::Ready | BootState::Failed)
    }
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootState::Idle => "idle",
            BootState::Gating => "gating",
            BootState::Ordering => "ordering",
            BootState::Registering => "registering",
            BootState::Booting => "booting",
            BootState::Ready => "ready",
            BootState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Where a single provider is in the bootstrap run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Discovered,
    GatedIn,
    GatedOut,
    Registered,
    Booted,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderState::Discovered => "discovered",
            ProviderState::GatedIn => "gated-in",
            ProviderState::GatedOut => "gated-out",
            ProviderState::Registered => "registered",
            ProviderState::Booted => "booted",
        };
        write!(f, "{}", name)
    }
}

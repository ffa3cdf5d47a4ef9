use std::fmt::Display;

/// Where an [`AutoSaver`](super::AutoSaver) is in its save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Nothing pending.
    Idle,
    /// A debounce timer is running; a save will follow unless data changes again.
    Scheduled,
    /// A write is in flight.
    Saving,
}

impl Display for SaveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            SaveState::Idle => "Idle",
            SaveState::Scheduled => "Scheduled",
            SaveState::Saving => "Saving",
        };
        write!(f, "{state}")
    }
}

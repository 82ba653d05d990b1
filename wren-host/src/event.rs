use machine::Key;

/// How the host classified a key event
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputKind {
    /// The key went down
    Press,
    /// The key came back up
    Release,
    /// The key was held past the host's long-press threshold
    LongPress,
}

/// An evaluation trigger, delivered to the session scheduler
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Key event from the host input service
    Input {
        /// Which physical control
        key: Key,
        /// Press / release / long-press classification
        kind: InputKind,
    },
    /// Periodic frame tick
    Tick,
}

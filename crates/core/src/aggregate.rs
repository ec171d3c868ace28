//! Aggregate traits for workflow documents (purchases, sales, transfers, counts,
//! cash sessions).

/// Aggregate root marker + minimal interface.
pub trait AggregateRoot {
    /// Strongly-typed document identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied to this document so far.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a document stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stream to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

/// Document state machine semantics (pure, deterministic).
///
/// - **Decision logic**: `handle(&self, cmd)` validates the requested transition
///   against the current state and returns the events describing it.
/// - **State mutation**: `apply(&mut self, event)` evolves state.
///
/// Neither method touches stock, cash or the general ledger. The engine performs
/// those writes in the same transaction that persists the returned events.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event (+1 version per event).
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events to emit given the current state and a command.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}

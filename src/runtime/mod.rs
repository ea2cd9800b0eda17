//! Single-writer async runtime, live queries and the preference writer.

/// Change notifications emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
/// Live query subscriptions.
pub mod live;
/// Debounced preference writer.
pub mod prefs;

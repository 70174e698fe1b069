//! # ibtester-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceSource` — list raw one-wire bus entries
//!   - `Transport` — hand a formatted state event to the messaging channel
//! - Provide the use-cases:
//!   - `DeviceRegistry` — filtered snapshots of the bus
//!   - `PresenceTest` — baseline, poll, debounce, confirm or time out
//!   - `Dispatcher` — decode commands, route them, answer each exactly once
//!   - `EventPublisher` — format and send state events, at most once
//!
//! ## Dependency rule
//! Depends on `ibtester-domain` only (plus `tokio` for tasks, channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod ports;
pub mod presence_test;
pub mod publisher;
pub mod registry;

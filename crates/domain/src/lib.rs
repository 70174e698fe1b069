//! # ibtester-domain
//!
//! Pure domain model for the one-wire presence tester.
//!
//! ## Responsibilities
//! - Foundational types: bus device identifiers, device snapshots, error conventions
//! - Define **filters** (exclude-list and family allow-list applied to raw bus entries)
//! - Define **commands** decoded from inbound control messages
//! - Define **outcomes** of a presence test
//! - Define **state events** and their wire representation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;

pub mod command;
pub mod device;
pub mod event;
pub mod filter;
pub mod outcome;

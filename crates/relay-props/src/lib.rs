// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property sets for Relay.
//!
//! The rendering engine is configured through a flat, namespaced key → values
//! document (`scene.materials.floor.kd = 0.8 0.8 0.8`). This crate holds that
//! primitive plus the aggregator that keeps two views over it:
//!
//! - the **cumulative** view, from which a full configuration can be rebuilt;
//! - the **pending** view, the delta since the last [`PropertyAggregator::pop`].
//!
//! It contains no scene knowledge; see `relay-sync` for the cache that feeds it.

mod aggregator;
mod batch;
mod set;
mod value;

pub use aggregator::PropertyAggregator;
pub use batch::PropertyBatch;
pub use set::PropertySet;
pub use value::{IntoPropValues, PropValue};

//! Ordering of the terrain systems within `Update`.
//!
//! ```text
//! Observe  →  Regenerate  →  Budget  →  Stream  →  Report
//! ```
//!
//! * **Observe** – Detect a new tracked observer and settings edits; may send
//!   `RegenerateTerrain` or queue a full rebuild.
//! * **Regenerate** – Handle `RegenerateTerrain`: lay out and rebuild every
//!   tile synchronously.
//! * **Budget** – Apply budget settings edits, then adapt the per-frame budget
//!   while a streaming pass is running.
//! * **Stream** – Advance the streaming pass under the budget.
//! * **Report** – Periodic log summary.

use bevy::prelude::*;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerrainSet {
    Observe,
    Regenerate,
    Budget,
    Stream,
    Report,
}

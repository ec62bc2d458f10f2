use bevy::prelude::*;

use crate::streaming::RegenerateTerrain;
use crate::tile::TerrainTile;

/// The entity terrain is streamed around. Its `Transform` translation is read
/// fresh whenever a tile is evaluated; when no entity is set, or it has been
/// despawned, the observer is treated as standing at the origin.
#[derive(Resource, Debug, Default)]
pub struct TrackedObserver {
    pub entity: Option<Entity>,
    seen: Option<Option<Entity>>,
}

impl TrackedObserver {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity: Some(entity),
            seen: None,
        }
    }

    /// `true` on the first check and whenever `entity` differs from the last
    /// check. Records the current entity as seen.
    pub fn take_change(&mut self) -> bool {
        let changed = self.seen != Some(self.entity);
        self.seen = Some(self.entity);
        changed
    }

    pub fn position(&self, transforms: &Query<&Transform, Without<TerrainTile>>) -> Vec3 {
        self.entity
            .and_then(|e| transforms.get(e).ok())
            .map(|t| t.translation)
            .unwrap_or(Vec3::ZERO)
    }
}

/// A new observer reference (including the first frame) rebuilds everything.
pub fn detect_observer_change(
    mut observer: ResMut<TrackedObserver>,
    mut regenerate: EventWriter<RegenerateTerrain>,
) {
    if observer.bypass_change_detection().take_change() {
        info!("Tracked observer is now {:?}; regenerating terrain", observer.entity);
        regenerate.send(RegenerateTerrain);
    }
}

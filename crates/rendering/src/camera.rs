use bevy::prelude::*;

const FLY_SPEED: f32 = 1500.0;
const BOOST_MULTIPLIER: f32 = 5.0;
const TURN_SPEED: f32 = 1.2; // radians per second
const MIN_ALTITUDE: f32 = 50.0;
const CAMERA_PITCH: f32 = -0.35; // radians, looking slightly down

/// Free-flying camera that the terrain streams around.
#[derive(Component, Debug, Clone, Default)]
pub struct FlyCamera {
    /// Horizontal heading in radians; 0 looks down -z.
    pub yaw: f32,
    /// Constant forward drift in world units per second.
    pub cruise_speed: f32,
}

/// Horizontal forward and right vectors for a heading.
pub fn heading_axes(yaw: f32) -> (Vec3, Vec3) {
    let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
    let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());
    (forward, right)
}

/// WASD/arrows move on the ground plane, Q/E turn, Space/Ctrl climb and
/// sink, Shift boosts.
pub fn fly_camera_keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut cameras: Query<(&mut Transform, &mut FlyCamera)>,
) {
    let dt = time.delta_secs();
    for (mut transform, mut fly) in &mut cameras {
        if keys.pressed(KeyCode::KeyQ) {
            fly.yaw += TURN_SPEED * dt;
        }
        if keys.pressed(KeyCode::KeyE) {
            fly.yaw -= TURN_SPEED * dt;
        }

        let (forward, right) = heading_axes(fly.yaw);
        let mut dir = Vec3::ZERO;
        if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
            dir += forward;
        }
        if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
            dir -= forward;
        }
        if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
            dir += right;
        }
        if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
            dir -= right;
        }
        if keys.pressed(KeyCode::Space) {
            dir += Vec3::Y;
        }
        if keys.pressed(KeyCode::ControlLeft) {
            dir -= Vec3::Y;
        }

        let boost = if keys.pressed(KeyCode::ShiftLeft) {
            BOOST_MULTIPLIER
        } else {
            1.0
        };
        let mut velocity = dir.normalize_or_zero() * FLY_SPEED * boost;
        velocity += forward * fly.cruise_speed;

        transform.translation += velocity * dt;
        transform.translation.y = transform.translation.y.max(MIN_ALTITUDE);
        transform.rotation =
            Quat::from_rotation_y(fly.yaw) * Quat::from_rotation_x(CAMERA_PITCH);
    }
}

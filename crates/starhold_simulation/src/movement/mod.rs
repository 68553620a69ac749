//! Movement системы: тик модификаторов, интеграция velocity, пути
//!
//! Порядок внутри SimSet::Movement:
//! 1. tick_speed_modifiers — декремент slow/haste, пересчёт множителя
//! 2. apply_velocity — свободное движение (entity без пути)
//! 3. follow_paths — движение врагов по waypoint'ам
//!
//! Stun/Freeze останавливают движение целиком (проверка StatusEffects),
//! не через множитель — у него жёсткий пол 0.1.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat::status::StatusEffects;
use crate::combat::Dead;
use crate::components::{Enemy, Movement, PathFollow, PathStep};
use crate::SimSet;

/// Событие: враг дошёл до станции (урон ядру — дело внешней игры)
#[derive(Event, Debug, Clone)]
pub struct EnemyReachedCore {
    pub enemy: Entity,
    pub core_damage: u32,
}

/// Реестр именованных путей
///
/// Пути immutable после регистрации: враги держат собственную копию точек,
/// менять путь "под ногами" нельзя.
#[derive(Resource, Debug, Clone)]
pub struct PathRegistry {
    paths: HashMap<String, Vec<Vec2>>,
}

impl Default for PathRegistry {
    fn default() -> Self {
        let mut registry = Self {
            paths: HashMap::new(),
        };

        // Дефолтные пути (слева направо и сверху к центру)
        registry.register(
            "main_path",
            vec![
                Vec2::new(0.0, 384.0),
                Vec2::new(200.0, 384.0),
                Vec2::new(200.0, 500.0),
                Vec2::new(400.0, 500.0),
                Vec2::new(400.0, 300.0),
                Vec2::new(600.0, 300.0),
                Vec2::new(600.0, 384.0),
                Vec2::new(800.0, 384.0),
            ],
        );
        registry.register(
            "alternate_path",
            vec![
                Vec2::new(512.0, 0.0),
                Vec2::new(512.0, 200.0),
                Vec2::new(400.0, 300.0),
                Vec2::new(300.0, 300.0),
                Vec2::new(300.0, 400.0),
                Vec2::new(500.0, 400.0),
                Vec2::new(512.0, 384.0),
            ],
        );

        registry
    }
}

impl PathRegistry {
    pub fn get(&self, name: &str) -> Option<&[Vec2]> {
        self.paths.get(name).map(|p| p.as_slice())
    }

    pub fn register(&mut self, name: &str, points: Vec<Vec2>) {
        self.paths.insert(name.to_string(), points);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(|s| s.as_str())
    }
}

/// Система: тик speed-модификаторов (истёкшие удаляются, множитель пересчитан)
pub fn tick_speed_modifiers(mut query: Query<&mut Movement>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut movement in query.iter_mut() {
        movement.tick_modifiers(delta);
    }
}

/// Система: свободное движение по velocity (entity без PathFollow)
///
/// Замедление применяется постоянно — без подпитки velocity затухает.
pub fn apply_velocity(
    mut query: Query<(&mut Movement, &mut Transform), (Without<PathFollow>, Without<Dead>)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut movement, mut transform) in query.iter_mut() {
        let effective = movement.velocity * movement.speed_multiplier;
        transform.translation.x += effective.x * delta;
        transform.translation.y += effective.y * delta;

        if movement.velocity.length_squared() > 0.01 {
            let deceleration = movement.deceleration * delta;
            let speed = movement.velocity.length();
            if speed > deceleration {
                movement.velocity = movement.velocity.normalize() * (speed - deceleration);
            } else {
                movement.velocity = Vec2::ZERO;
            }
        }
    }
}

/// Система: движение врагов по пути
///
/// Дошедший до конца враг испускает EnemyReachedCore и despawn'ится —
/// урон станции и потеря жизней считает внешняя игра.
pub fn follow_paths(
    mut commands: Commands,
    mut query: Query<
        (
            Entity,
            &mut PathFollow,
            &mut Transform,
            &Movement,
            Option<&StatusEffects>,
            Option<&Enemy>,
        ),
        Without<Dead>,
    >,
    time: Res<Time<Fixed>>,
    mut reached_events: EventWriter<EnemyReachedCore>,
) {
    let delta = time.delta_secs();

    for (entity, mut path, mut transform, movement, effects, enemy) in query.iter_mut() {
        // Stun/Freeze: полная остановка
        if effects.map(|e| e.movement_locked()).unwrap_or(false) {
            continue;
        }

        if path.advance(&mut transform, delta, movement.speed_multiplier) == PathStep::Completed {
            if let Some(enemy) = enemy {
                reached_events.write(EnemyReachedCore {
                    enemy: entity,
                    core_damage: enemy.core_damage,
                });
                commands.entity(entity).despawn();

                crate::log_info(&format!(
                    "Enemy {:?} reached the core (damage {})",
                    entity, enemy.core_damage
                ));
            }
        }
    }
}

/// Movement Plugin
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EnemyReachedCore>()
            .init_resource::<PathRegistry>()
            .add_systems(
                FixedUpdate,
                (tick_speed_modifiers, apply_velocity, follow_paths)
                    .chain()
                    .in_set(SimSet::Movement),
            );
    }
}

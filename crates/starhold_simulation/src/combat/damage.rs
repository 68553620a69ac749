//! Damage типы, события и death handling
//!
//! Сам pipeline живёт в Health::take_damage (components/health.rs) —
//! здесь описание одного удара (DamageInstance), события-хуки для
//! презентационного слоя и системы обработки смертей.
//!
//! События — fire-and-forget: симуляция корректна и при нуле читателей.

use bevy::prelude::*;

use crate::components::{Enemy, Movement, SplitOnDeath};

/// Тип урона
///
/// Electric получает ×1.5 против целей со щитами (шаг 2 pipeline).
/// True пропускает броню и резисты (singularity collapse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum DamageType {
    Laser,
    Kinetic,
    Plasma,
    Electric,
    Nano,
    Gravity,
    Cryo,
    Explosive,
    Corrupt,
    True,
}

/// Описание одного удара, входящего в Health::take_damage
///
/// Crit roll делается на стороне орудия (один раз на выстрел);
/// pipeline лишь применяет multiplier.
#[derive(Debug, Clone, Copy)]
pub struct DamageInstance {
    pub amount: f32,
    pub damage_type: DamageType,
    pub is_critical: bool,
    pub crit_multiplier: f32,
    pub armor_pierce: f32,
    pub bonus_vs_shields: f32,
    /// Суммарный Vulnerable-бонус цели (0.25 = +25% урона)
    pub vulnerability_bonus: f32,
}

impl DamageInstance {
    pub fn new(amount: f32, damage_type: DamageType) -> Self {
        Self {
            amount,
            damage_type,
            is_critical: false,
            crit_multiplier: 1.5,
            armor_pierce: 0.0,
            bonus_vs_shields: 0.0,
            vulnerability_bonus: 0.0,
        }
    }
}

/// Событие: урон нанесён (хук onDamageDealt для презентации)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
    pub is_critical: bool,
    pub target_died: bool,
}

/// Событие: entity умер (хук onEntityDied)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Событие: враг убит, награда для экономики внешней игры
#[derive(Event, Debug, Clone)]
pub struct EnemyKilled {
    pub enemy: Entity,
    pub salvage: u32,
}

/// Событие: запрос спавна миньонов (split-on-death).
/// Consumed внешним wave director'ом — ядро само миньонов не спавнит.
#[derive(Event, Debug, Clone)]
pub struct SpawnMinions {
    pub kind: crate::components::EnemyKind,
    pub count: u32,
    pub position: Vec2,
    pub path_progress: f32,
}

/// Компонент-маркер: entity мертв (Health::is_dead)
///
/// Мёртвые исключаются из таргетинга, движения и всех воздействий.
#[derive(Component, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct Dead;

/// Despawn по таймауту (время презентационному слою на death effect)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DespawnAfter {
    pub remaining: f32,
}

impl Default for DespawnAfter {
    fn default() -> Self {
        Self { remaining: 0.5 }
    }
}

/// Система: обработка EntityDied
///
/// 1. Останавливаем движение (velocity = 0 сразу, не через Commands)
/// 2. Вешаем Dead + DespawnAfter
/// 3. EnemyKilled с salvage для экономики
/// 4. SplitOnDeath → SpawnMinions запрос
pub fn handle_deaths(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut killed_events: EventWriter<EnemyKilled>,
    mut minion_events: EventWriter<SpawnMinions>,
    mut bodies: Query<(
        Option<&mut Movement>,
        Option<&Enemy>,
        Option<&SplitOnDeath>,
        Option<&Transform>,
        Option<&crate::components::PathFollow>,
    )>,
) {
    for event in death_events.read() {
        let Ok((movement, enemy, split, transform, path)) = bodies.get_mut(event.entity) else {
            continue; // Уже despawned — молча пропускаем
        };

        if let Some(mut movement) = movement {
            movement.stop();
        }

        if let Some(enemy) = enemy {
            killed_events.write(EnemyKilled {
                enemy: event.entity,
                salvage: enemy.salvage_value,
            });
        }

        if let (Some(split), Some(transform)) = (split, transform) {
            minion_events.write(SpawnMinions {
                kind: split.kind,
                count: split.count,
                position: transform.translation.truncate(),
                path_progress: path.map(|p| p.progress).unwrap_or(0.0),
            });
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert((Dead, DespawnAfter::default()));
        }

        crate::log_info(&format!(
            "Entity {:?} died (killer: {:?})",
            event.entity, event.killer
        ));
    }
}

/// Система: despawn мёртвых по таймауту
pub fn despawn_after_timeout(
    mut commands: Commands,
    mut query: Query<(Entity, &mut DespawnAfter)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut despawn) in query.iter_mut() {
        despawn.remaining -= delta;
        if despawn.remaining <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_instance_defaults() {
        let hit = DamageInstance::new(25.0, DamageType::Laser);

        assert_eq!(hit.amount, 25.0);
        assert!(!hit.is_critical);
        assert_eq!(hit.crit_multiplier, 1.5);
        assert_eq!(hit.armor_pierce, 0.0);
        assert_eq!(hit.vulnerability_bonus, 0.0);
    }

    #[test]
    fn test_damage_dealt_event() {
        let event = DamageDealt {
            attacker: Entity::PLACEHOLDER,
            target: Entity::PLACEHOLDER,
            damage: 15.0,
            is_critical: true,
            target_died: false,
        };

        assert_eq!(event.damage, 15.0);
        assert!(event.is_critical);
        assert!(!event.target_died);
    }

    #[test]
    fn test_entity_died_event() {
        let event = EntityDied {
            entity: Entity::PLACEHOLDER,
            killer: Some(Entity::PLACEHOLDER),
        };

        assert!(event.killer.is_some());
    }
}

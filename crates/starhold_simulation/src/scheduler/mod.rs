//! Отложенные действия, привязанные к СИМУЛЯЦИОННОМУ времени
//!
//! Никаких OS-таймеров и sleep'ов: полёт ракеты, дуга мортиры, заряд
//! solar lance и collapse сингулярности — записи в ActionQueue с fire_at
//! по Time<Fixed>. Пауза игры (virtual time) останавливает и их; тесты
//! продвигают время детерминированно.
//!
//! Cancellation: entity умер/удалён до срабатывания → действие молча
//! no-op'ится (liveness-проверки при исполнении, не при планировании).

use bevy::prelude::*;

use crate::combat::damage::{DamageDealt, DamageInstance, DamageType, EntityDied};
use crate::combat::status::{EffectApplied, StatusEffect};
use crate::combat::weapon::{
    apply_status, enemies_in_radius, segment_distance, strike_enemy, EnemyQuery,
};
use crate::components::Emplacement;
use crate::components::Enemy;
use crate::targeting::Targeting;

/// Зона урона на земле (plasma pool). Живёт вместе с DespawnAfter.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PoolZone {
    pub radius: f32,
    pub damage_per_second: f32,
}

impl Default for PoolZone {
    fn default() -> Self {
        Self {
            radius: 48.0,
            damage_per_second: 20.0,
        }
    }
}

/// Отложенное действие
#[derive(Debug, Clone)]
pub enum ScheduledAction {
    /// Удар ракеты по цели (полёт + stagger). Цель умерла — удар дропается.
    MissileStrike {
        source: Entity,
        target: Entity,
        hit: DamageInstance,
        splash_radius: f32,
        splash_percent: f32,
    },
    /// Падение мортирного снаряда в точку, зафиксированную при выстреле
    MortarImpact {
        source: Entity,
        point: Vec2,
        /// Цель, по которой целились: полный урон, остальным — splash
        aimed: Entity,
        hit: DamageInstance,
        splash_radius: f32,
        splash_percent: f32,
        pool: Option<PoolZone>,
    },
    /// Луч solar lance после заряда: от орудия через самую дальнюю текущую цель
    BeamFire {
        source: Entity,
        width: f32,
        hit: DamageInstance,
        /// Heat на задетых (tier 3+ лучи)
        heat: Option<StatusEffect>,
    },
    /// Collapse-импульс сингулярности: True damage в радиусе.
    /// Живёт независимо от орудия — оно могло уже выстрелить снова.
    SingularityCollapse {
        source: Entity,
        center: Vec2,
        radius: f32,
        damage: f32,
    },
}

#[derive(Debug, Clone)]
struct QueuedAction {
    fire_at: f64,
    seq: u64,
    action: ScheduledAction,
}

/// Очередь отложенных действий (единственный "разделяемый ресурс" симуляции)
#[derive(Resource, Debug, Default)]
pub struct ActionQueue {
    entries: Vec<QueuedAction>,
    seq: u64,
}

impl ActionQueue {
    pub fn schedule(&mut self, fire_at: f64, action: ScheduledAction) {
        self.entries.push(QueuedAction {
            fire_at,
            seq: self.seq,
            action,
        });
        self.seq += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Забрать созревшие действия, в порядке (fire_at, порядок планирования)
    fn take_due(&mut self, now: f64) -> Vec<QueuedAction> {
        let mut due: Vec<QueuedAction> = Vec::new();
        self.entries.retain(|entry| {
            if entry.fire_at <= now {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.fire_at
                .partial_cmp(&b.fire_at)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.seq.cmp(&b.seq))
        });
        due
    }
}

/// Система: исполнение созревших действий
pub fn drain_action_queue(
    mut commands: Commands,
    mut queue: ResMut<ActionQueue>,
    time: Res<Time<Fixed>>,
    emplacements: Query<(&Transform, &Targeting), (With<Emplacement>, Without<Enemy>)>,
    mut enemies: EnemyQuery,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    mut effect_events: EventWriter<EffectApplied>,
) {
    let now = time.elapsed_secs_f64();

    for queued in queue.take_due(now) {
        match queued.action {
            ScheduledAction::MissileStrike {
                source,
                target,
                hit,
                splash_radius,
                splash_percent,
            } => {
                // Цель умерла в полёте — удар молча дропается
                let Ok((_, transform, ..)) = enemies.get(target) else {
                    continue;
                };
                let impact = transform.translation.truncate();

                strike_enemy(
                    &mut enemies,
                    target,
                    source,
                    hit,
                    &mut damage_events,
                    &mut died_events,
                );

                let mut splash_hit = hit;
                splash_hit.amount *= splash_percent;
                for other in enemies_in_radius(&enemies, impact, splash_radius) {
                    if other == target {
                        continue;
                    }
                    strike_enemy(
                        &mut enemies,
                        other,
                        source,
                        splash_hit,
                        &mut damage_events,
                        &mut died_events,
                    );
                }
            }

            ScheduledAction::MortarImpact {
                source,
                point,
                aimed,
                hit,
                splash_radius,
                splash_percent,
                pool,
            } => {
                let mut splash_hit = hit;
                splash_hit.amount *= splash_percent;

                for entity in enemies_in_radius(&enemies, point, splash_radius) {
                    // Прицельная цель ловит полный урон, остальные — splash
                    let strike = if entity == aimed { hit } else { splash_hit };
                    strike_enemy(
                        &mut enemies,
                        entity,
                        source,
                        strike,
                        &mut damage_events,
                        &mut died_events,
                    );
                }

                if let Some(pool) = pool {
                    commands.spawn((
                        pool,
                        Transform::from_translation(point.extend(0.0)),
                        crate::combat::DespawnAfter { remaining: 3.0 },
                    ));
                }
            }

            ScheduledAction::BeamFire {
                source,
                width,
                hit,
                heat,
            } => {
                // Орудие снесли за время заряда → no-op
                let Ok((transform, targeting)) = emplacements.get(source) else {
                    continue;
                };
                let origin = transform.translation.truncate();

                // Самая дальняя из живых текущих целей; целей нет → луч не стреляет
                let farthest = targeting
                    .targets()
                    .iter()
                    .filter_map(|&e| {
                        enemies
                            .get(e)
                            .ok()
                            .map(|(_, t, ..)| (e, origin.distance(t.translation.truncate())))
                    })
                    .max_by(|a, b| {
                        a.1.partial_cmp(&b.1)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then_with(|| b.0.index().cmp(&a.0.index()))
                    });
                let Some((farthest_entity, distance)) = farthest else {
                    continue;
                };
                let Ok((_, t, ..)) = enemies.get(farthest_entity) else {
                    continue;
                };
                let through = t.translation.truncate();
                let direction = (through - origin).normalize_or_zero();
                if direction == Vec2::ZERO {
                    continue;
                }
                // Луч покрывает весь range орудия, не только до цели
                let end = origin + direction * targeting.range.max(distance);

                for entity in beam_targets(&enemies, origin, end, width * 0.5) {
                    strike_enemy(
                        &mut enemies,
                        entity,
                        source,
                        hit,
                        &mut damage_events,
                        &mut died_events,
                    );
                    if let Some(heat) = heat.clone() {
                        apply_status(&mut enemies, entity, heat, &mut effect_events);
                    }
                }
            }

            ScheduledAction::SingularityCollapse {
                source,
                center,
                radius,
                damage,
            } => {
                // Выполняется всегда; пустой радиус — корректный no-op
                let hit = DamageInstance::new(damage, DamageType::True);
                for entity in enemies_in_radius(&enemies, center, radius) {
                    strike_enemy(
                        &mut enemies,
                        entity,
                        source,
                        hit,
                        &mut damage_events,
                        &mut died_events,
                    );
                }
            }
        }
    }
}

/// Враги в коридоре луча (half_width от отрезка), стабильный порядок
fn beam_targets(enemies: &EnemyQuery, a: Vec2, b: Vec2, half_width: f32) -> Vec<Entity> {
    let mut found: Vec<(u32, Entity)> = enemies
        .iter()
        .filter(|(_, t, health, ..)| {
            health.is_alive() && segment_distance(t.translation.truncate(), a, b) <= half_width
        })
        .map(|(e, ..)| (e.index(), e))
        .collect();
    found.sort_by_key(|(index, _)| *index);
    found.into_iter().map(|(_, e)| e).collect()
}

/// Система: тик plasma pool зон
///
/// Дренаж как у DOT — мимо щитов/брони (см. Health::drain).
pub fn tick_pool_zones(
    pools: Query<(&PoolZone, &Transform)>,
    mut enemies: EnemyQuery,
    time: Res<Time<Fixed>>,
    mut died_events: EventWriter<EntityDied>,
) {
    let delta = time.delta_secs();

    for (pool, pool_transform) in pools.iter() {
        let center = pool_transform.translation.truncate();

        for (entity, transform, mut health, ..) in enemies.iter_mut() {
            if !health.is_alive() {
                continue;
            }
            if center.distance(transform.translation.truncate()) > pool.radius {
                continue;
            }
            if health.drain(pool.damage_per_second * delta) {
                died_events.write(EntityDied {
                    entity,
                    killer: None,
                });
            }
        }
    }
}

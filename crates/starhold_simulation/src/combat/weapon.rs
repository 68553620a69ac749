//! Weapon fire dispatch: один проход по орудиям, sum-type по архетипам
//!
//! State machine орудия: Idle → (cooldown == 0 AND цель есть) → Fire → Idle.
//! Порядок разрешения в тике фиксирован: орудия обходятся по entity index.
//!
//! Damage math НЕ дублируется по архетипам — каждый удар собирается в
//! DamageInstance и уходит в Health::take_damage. Архетип определяет только
//! МНОЖЕСТВО целей и вторичные эффекты.
//!
//! Отложенные части (полёт ракет, дуга мортиры, заряд lance, collapse
//! сингулярности) уходят в ActionQueue — см. crate::scheduler.

use bevy::prelude::*;
use rand::Rng;

use crate::combat::damage::{DamageDealt, DamageInstance, DamageType, EntityDied};
use crate::combat::status::{EffectApplied, StatusEffect, StatusEffectKind, StatusEffects};
use crate::combat::weapon_stats::{SupportKind, SustainedKind, TowerKind, WeaponArchetype, WeaponStats};
use crate::combat::Dead;
use crate::components::{Emplacement, Enemy, Health, Movement};
use crate::scheduler::{ActionQueue, PoolZone, ScheduledAction};
use crate::targeting::Targeting;
use crate::DeterministicRng;

/// Событие: орудие выстрелило (презентационный хук: визуал/звук выстрела)
#[derive(Event, Debug, Clone)]
pub struct WeaponFired {
    pub emplacement: Entity,
    pub kind: TowerKind,
    pub primary_target: Option<Entity>,
}

/// Событие: начался заряд (solar lance) — duration для анимации
#[derive(Event, Debug, Clone)]
pub struct ChargeStarted {
    pub emplacement: Entity,
    pub duration: f32,
}

/// Событие: support-платформа сгенерировала ресурсы (внешняя экономика)
#[derive(Event, Debug, Clone)]
pub struct ResourcesGenerated {
    pub emplacement: Entity,
    pub amount: f32,
}

/// Query по живым врагам, общий для fire dispatch и scheduler'а
pub(crate) type EnemyQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Transform,
        &'static mut Health,
        &'static mut StatusEffects,
        Option<&'static mut Movement>,
    ),
    (With<Enemy>, Without<Dead>),
>;

/// Система: fire dispatch
///
/// Cooldown уже оттикан update_weapon_cooldowns (раньше в цепочке).
/// Орудие стреляет если cooldown == 0 И (цель есть ИЛИ архетип её не требует).
/// Cooldown стартует от момента выстрела — долга за пропущенные интервалы нет.
pub fn fire_weapons(
    mut queue: ResMut<ActionQueue>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut emplacements: Query<
        (Entity, &Transform, &Emplacement, &Targeting, &mut WeaponStats),
        Without<Enemy>,
    >,
    mut enemies: EnemyQuery,
    mut fired_events: EventWriter<WeaponFired>,
    mut charge_events: EventWriter<ChargeStarted>,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    mut effect_events: EventWriter<EffectApplied>,
) {
    let now = time.elapsed_secs_f64();

    // Стабильный порядок разрешения внутри тика
    let mut towers: Vec<_> = emplacements.iter_mut().collect();
    towers.sort_by_key(|(entity, ..)| entity.index());

    for (tower, transform, emplacement, targeting, mut weapon) in towers {
        // Support-пульсы (щиты/ремонт/ресурсы) обрабатывает support_pulse
        if matches!(
            weapon.archetype,
            WeaponArchetype::Support(
                SupportKind::ShieldProjector { .. }
                    | SupportKind::RepairSpire { .. }
                    | SupportKind::ResourceHarvester { .. }
            )
        ) {
            continue;
        }

        if !weapon.can_fire() {
            continue;
        }

        // Живые цели из последнего пересчёта (между пересчётами цель могла
        // умереть — фильтруем по текущему состоянию)
        let targets: Vec<Entity> = targeting
            .targets()
            .iter()
            .copied()
            .filter(|&e| enemies.get(e).is_ok())
            .collect();

        if weapon.archetype.needs_target() && targets.is_empty() {
            continue;
        }

        let origin = transform.translation.truncate();
        let tier = emplacement.tier;
        let is_critical = roll_crit(&weapon, &mut rng);

        match weapon.archetype {
            WeaponArchetype::Direct => {
                let Some(&primary) = targets.first() else {
                    continue;
                };
                let hit = weapon_hit(&weapon, weapon.damage, is_critical);
                strike_enemy(
                    &mut enemies,
                    primary,
                    tower,
                    hit,
                    &mut damage_events,
                    &mut died_events,
                );

                // Лазер с tier 3 поджигает
                if emplacement.kind == TowerKind::LaserTurret && tier >= 3 {
                    apply_status(
                        &mut enemies,
                        primary,
                        StatusEffect::new(StatusEffectKind::Heat, 3.0, 0.1)
                            .stacking(3)
                            .with_dps(weapon.damage * 0.1),
                        &mut effect_events,
                    );
                }
            }

            WeaponArchetype::Piercing { pierce } => {
                // Цели уже упорядочены по дистанции (targeting Nearest)
                for &target in targets.iter().take(pierce as usize) {
                    let hit = weapon_hit(&weapon, weapon.damage, is_critical);
                    strike_enemy(
                        &mut enemies,
                        target,
                        tower,
                        hit,
                        &mut damage_events,
                        &mut died_events,
                    );

                    if tier >= 4 {
                        apply_status(
                            &mut enemies,
                            target,
                            StatusEffect::new(StatusEffectKind::Slow, 1.5, 0.15),
                            &mut effect_events,
                        );
                    }
                }
            }

            WeaponArchetype::Chaining {
                max_hops,
                hop_range,
                shock_chance,
            } => {
                let Some(&primary) = targets.first() else {
                    continue;
                };
                let mut chained = vec![primary];
                let mut chain_damage = weapon.damage;

                strike_enemy(
                    &mut enemies,
                    primary,
                    tower,
                    weapon_hit(&weapon, chain_damage, is_critical),
                    &mut damage_events,
                    &mut died_events,
                );

                let mut previous = primary;
                for _ in 0..max_hops {
                    // Затухание строго геометрическое, цель не бьётся дважды
                    chain_damage *= 1.0 - weapon.chain_damage_reduction;

                    let Some(from) = enemy_position(&enemies, previous) else {
                        break;
                    };
                    let Some(next) = nearest_enemy_excluding(&enemies, from, hop_range, &chained)
                    else {
                        break; // Цепь обрывается — некуда прыгать
                    };

                    strike_enemy(
                        &mut enemies,
                        next,
                        tower,
                        weapon_hit(&weapon, chain_damage, is_critical),
                        &mut damage_events,
                        &mut died_events,
                    );

                    if rng.rng.gen::<f32>() < shock_chance {
                        apply_status(
                            &mut enemies,
                            next,
                            StatusEffect::new(StatusEffectKind::Shock, 0.5, 1.0),
                            &mut effect_events,
                        );
                    }

                    chained.push(next);
                    previous = next;
                }
            }

            WeaponArchetype::Splash {
                arcing,
                flight_delay,
                volley,
                volley_stagger,
                leaves_pool,
            } => {
                let missile_count = if tier >= 3 { volley.max(2) } else { volley };

                if arcing {
                    // Мортира: точка прицеливания фиксируется в момент выстрела
                    let Some(&aimed) = targets.first() else {
                        continue;
                    };
                    let Some(point) = enemy_position(&enemies, aimed) else {
                        continue;
                    };
                    queue.schedule(
                        now + flight_delay as f64,
                        ScheduledAction::MortarImpact {
                            source: tower,
                            point,
                            aimed,
                            hit: weapon_hit(&weapon, weapon.damage, is_critical),
                            splash_radius: weapon.splash_radius,
                            splash_percent: weapon.splash_damage_percent,
                            pool: (leaves_pool && tier >= 3).then_some(PoolZone {
                                radius: weapon.splash_radius * 0.6,
                                damage_per_second: 20.0,
                            }),
                        },
                    );
                } else {
                    // Ракеты: staggered запуск, урон делится между ракетами
                    for i in 0..missile_count {
                        let Some(target) = targets.get(i as usize).or_else(|| targets.first()).copied()
                        else {
                            break;
                        };
                        let hit = weapon_hit(
                            &weapon,
                            weapon.damage / missile_count as f32,
                            is_critical,
                        );
                        queue.schedule(
                            now + (flight_delay + volley_stagger * i as f32) as f64,
                            ScheduledAction::MissileStrike {
                                source: tower,
                                target,
                                hit,
                                splash_radius: weapon.splash_radius,
                                splash_percent: weapon.splash_damage_percent,
                            },
                        );
                    }
                }
            }

            WeaponArchetype::Sustained(kind) => {
                fire_sustained(
                    kind,
                    &targets,
                    tower,
                    tier,
                    &weapon,
                    is_critical,
                    &mut enemies,
                    &mut rng,
                    &mut damage_events,
                    &mut died_events,
                    &mut effect_events,
                );
            }

            WeaponArchetype::Beam {
                charge_delay,
                beam_width,
            } => {
                // Заряд → отложенный луч; отменяем по факту (no-op если орудие
                // снесли или целей не осталось)
                charge_events.write(ChargeStarted {
                    emplacement: tower,
                    duration: charge_delay,
                });
                queue.schedule(
                    now + charge_delay as f64,
                    ScheduledAction::BeamFire {
                        source: tower,
                        width: beam_width,
                        hit: weapon_hit(&weapon, weapon.damage, is_critical),
                        heat: (tier >= 3).then(|| {
                            StatusEffect::new(StatusEffectKind::Heat, 6.0, 0.25)
                                .stacking(1)
                                .with_dps(weapon.damage * 0.05)
                        }),
                    },
                );
            }

            WeaponArchetype::PullCollapse {
                pull_radius,
                collapse_delay,
                collapse_radius_factor,
            } => {
                let Some(&primary) = targets.first() else {
                    continue;
                };
                let Some(center) = enemy_position(&enemies, primary) else {
                    continue;
                };

                for target in enemies_in_radius(&enemies, center, pull_radius) {
                    apply_status(
                        &mut enemies,
                        target,
                        StatusEffect::new(StatusEffectKind::Gravity, 3.0, 0.6),
                        &mut effect_events,
                    );
                    if tier >= 2 {
                        apply_status(
                            &mut enemies,
                            target,
                            StatusEffect::new(StatusEffectKind::Vulnerable, 3.0, 0.25)
                                .with_vulnerability(25.0),
                            &mut effect_events,
                        );
                    }
                }

                // Collapse-импульс живёт независимо от орудия и его целей
                queue.schedule(
                    now + collapse_delay as f64,
                    ScheduledAction::SingularityCollapse {
                        source: tower,
                        center,
                        radius: pull_radius * collapse_radius_factor,
                        damage: weapon.damage,
                    },
                );
            }

            WeaponArchetype::Aura { slow_intensity } => {
                // Gravity well: rolling slow по всем в радиусе, refresh каждым пульсом
                let duration = weapon.fire_interval() * 1.2;
                for target in enemies_in_radius(&enemies, origin, targeting.range) {
                    apply_status(
                        &mut enemies,
                        target,
                        StatusEffect::new(StatusEffectKind::Gravity, duration, slow_intensity),
                        &mut effect_events,
                    );
                }
            }

            WeaponArchetype::Support(SupportKind::DroneBay) => {
                // Дроны: лёгкие kinetic-удары по каждой текущей цели
                for &target in &targets {
                    let mut hit = weapon_hit(&weapon, weapon.damage, is_critical);
                    hit.damage_type = DamageType::Kinetic;
                    strike_enemy(
                        &mut enemies,
                        target,
                        tower,
                        hit,
                        &mut damage_events,
                        &mut died_events,
                    );
                }
            }

            // Остальные support-виды отсеяны в начале цикла
            WeaponArchetype::Support(_) => {}
        }

        weapon.start_cooldown();
        fired_events.write(WeaponFired {
            emplacement: tower,
            kind: emplacement.kind,
            primary_target: targets.first().copied(),
        });
    }
}

/// Sustained-архетипы: одновременный эффект по всем currentTargets, без falloff
#[allow(clippy::too_many_arguments)]
fn fire_sustained(
    kind: SustainedKind,
    targets: &[Entity],
    tower: Entity,
    tier: u8,
    weapon: &WeaponStats,
    is_critical: bool,
    enemies: &mut EnemyQuery,
    rng: &mut DeterministicRng,
    damage_events: &mut EventWriter<DamageDealt>,
    died_events: &mut EventWriter<EntityDied>,
    effect_events: &mut EventWriter<EffectApplied>,
) {
    for &target in targets {
        match kind {
            SustainedKind::Nanobots => {
                apply_status(
                    enemies,
                    target,
                    StatusEffect::new(
                        StatusEffectKind::Infection,
                        4.0 + (tier.saturating_sub(1)) as f32,
                        8.0,
                    )
                    .stacking(5)
                    .with_dps(weapon.damage / 4.0),
                    effect_events,
                );
                if tier >= 3 {
                    apply_status(
                        enemies,
                        target,
                        StatusEffect::new(StatusEffectKind::Corrode, 2.0, 2.0)
                            .stacking(10)
                            .with_armor_reduction(2.0),
                        effect_events,
                    );
                }
            }

            SustainedKind::CryoFoam => {
                strike_enemy(
                    enemies,
                    target,
                    tower,
                    weapon_hit(weapon, weapon.damage, is_critical),
                    damage_events,
                    died_events,
                );
                let slow_intensity = 0.25 + (tier.saturating_sub(1)) as f32 * 0.1;
                apply_status(
                    enemies,
                    target,
                    StatusEffect::new(StatusEffectKind::Slow, 2.5, slow_intensity),
                    effect_events,
                );
                if tier >= 3 && rng.rng.gen::<f32>() < 0.08 {
                    apply_status(
                        enemies,
                        target,
                        StatusEffect::new(StatusEffectKind::Freeze, 1.0, 1.0),
                        effect_events,
                    );
                }
            }

            SustainedKind::EmpBurst => {
                strike_enemy(
                    enemies,
                    target,
                    tower,
                    weapon_hit(weapon, weapon.damage, is_critical),
                    damage_events,
                    died_events,
                );
                if let Ok((_, _, mut health, _, _)) = enemies.get_mut(target) {
                    health.strip_shields(150.0 + (tier.saturating_sub(1)) as f32 * 50.0);
                }
                let stun_duration = 0.6 + (tier.saturating_sub(1)) as f32 * 0.1;
                apply_status(
                    enemies,
                    target,
                    StatusEffect::new(StatusEffectKind::Stun, stun_duration, 1.0),
                    effect_events,
                );
            }

            SustainedKind::Hack => {
                apply_status(
                    enemies,
                    target,
                    StatusEffect::new(StatusEffectKind::Hack, 2.0, 0.3)
                        .with_dps(weapon.damage),
                    effect_events,
                );
            }
        }
    }
}

/// Система: support-пульсы (щиты, ремонт, ресурсы) по союзным платформам
///
/// ParamSet: источники и получатели — одни и те же emplacement'ы,
/// поэтому решение и применение разнесены в два прохода.
pub fn support_pulse(
    mut set: ParamSet<(
        Query<(Entity, &Transform, &Targeting, &mut WeaponStats), With<Emplacement>>,
        Query<(Entity, &Transform, &mut Health), With<Emplacement>>,
    )>,
    mut resource_events: EventWriter<ResourcesGenerated>,
) {
    enum Pulse {
        Shields { amount: f32 },
        Repair { amount: f32 },
    }

    let mut pulses: Vec<(Entity, Vec2, f32, Pulse)> = Vec::new();

    {
        let mut p0 = set.p0();
        let mut sources: Vec<_> = p0.iter_mut().collect();
        sources.sort_by_key(|(entity, ..)| entity.index());

        for (entity, transform, targeting, mut weapon) in sources {
            let WeaponArchetype::Support(kind) = weapon.archetype else {
                continue;
            };
            if !weapon.can_fire() {
                continue;
            }

            let origin = transform.translation.truncate();
            match kind {
                SupportKind::ShieldProjector { amount } => {
                    pulses.push((entity, origin, targeting.range, Pulse::Shields { amount }));
                    weapon.start_cooldown();
                }
                SupportKind::RepairSpire { heal_amount } => {
                    pulses.push((
                        entity,
                        origin,
                        targeting.range,
                        Pulse::Repair {
                            amount: heal_amount,
                        },
                    ));
                    weapon.start_cooldown();
                }
                SupportKind::ResourceHarvester { per_second } => {
                    resource_events.write(ResourcesGenerated {
                        emplacement: entity,
                        amount: per_second * weapon.fire_interval(),
                    });
                    weapon.start_cooldown();
                }
                SupportKind::DroneBay => {} // Стреляет через fire_weapons
            }
        }
    }

    if pulses.is_empty() {
        return;
    }

    let mut receivers = set.p1();
    for (source, origin, range, pulse) in pulses {
        for (entity, transform, mut health) in receivers.iter_mut() {
            if entity == source {
                continue;
            }
            if origin.distance(transform.translation.truncate()) > range {
                continue;
            }
            match pulse {
                Pulse::Shields { amount } => health.restore_shields(amount),
                Pulse::Repair { amount } => health.heal(amount),
            }
        }
    }
}

// === Helpers (общие для fire dispatch и scheduler) ===

/// Собрать DamageInstance из weapon stats
pub(crate) fn weapon_hit(weapon: &WeaponStats, amount: f32, is_critical: bool) -> DamageInstance {
    DamageInstance {
        amount,
        damage_type: weapon.damage_type,
        is_critical,
        crit_multiplier: weapon.crit_multiplier,
        armor_pierce: weapon.armor_pierce,
        bonus_vs_shields: weapon.bonus_vs_shields,
        vulnerability_bonus: 0.0,
    }
}

pub(crate) fn roll_crit(weapon: &WeaponStats, rng: &mut DeterministicRng) -> bool {
    weapon.crit_chance > 0.0 && rng.rng.gen::<f32>() < weapon.crit_chance
}

/// Применить удар к врагу: vulnerability цели → pipeline → события.
/// No-op если цель умерла/исчезла (контракт liveness-проверок).
pub(crate) fn strike_enemy(
    enemies: &mut EnemyQuery,
    target: Entity,
    attacker: Entity,
    mut hit: DamageInstance,
    damage_events: &mut EventWriter<DamageDealt>,
    died_events: &mut EventWriter<EntityDied>,
) -> Option<crate::components::HitOutcome> {
    let Ok((_, _, mut health, effects, _)) = enemies.get_mut(target) else {
        return None;
    };
    if !health.is_alive() {
        return None;
    }

    hit.vulnerability_bonus = effects.vulnerability_bonus();
    let outcome = health.take_damage(&hit);

    damage_events.write(DamageDealt {
        attacker,
        target,
        damage: outcome.health_damage + outcome.shield_damage,
        is_critical: hit.is_critical,
        target_died: outcome.died,
    });

    if outcome.died {
        died_events.write(EntityDied {
            entity: target,
            killer: Some(attacker),
        });
    }

    Some(outcome)
}

/// Применить статус-эффект; EffectApplied только если не дропнут кап стаков
pub(crate) fn apply_status(
    enemies: &mut EnemyQuery,
    target: Entity,
    effect: StatusEffect,
    effect_events: &mut EventWriter<EffectApplied>,
) -> bool {
    let Ok((_, _, health, mut effects, _)) = enemies.get_mut(target) else {
        return false;
    };
    if !health.is_alive() {
        return false;
    }

    let kind = effect.kind;
    if effects.apply(effect) {
        effect_events.write(EffectApplied {
            entity: target,
            kind,
        });
        true
    } else {
        false
    }
}

pub(crate) fn enemy_position(enemies: &EnemyQuery, entity: Entity) -> Option<Vec2> {
    enemies
        .get(entity)
        .ok()
        .map(|(_, t, ..)| t.translation.truncate())
}

/// Враги в радиусе, отсортированы по entity index (стабильный порядок)
pub(crate) fn enemies_in_radius(enemies: &EnemyQuery, center: Vec2, radius: f32) -> Vec<Entity> {
    let mut found: Vec<(u32, Entity)> = enemies
        .iter()
        .filter(|(_, t, health, ..)| {
            health.is_alive() && center.distance(t.translation.truncate()) <= radius
        })
        .map(|(e, ..)| (e.index(), e))
        .collect();
    found.sort_by_key(|(index, _)| *index);
    found.into_iter().map(|(_, e)| e).collect()
}

/// Ближайший живой враг к точке, с исключениями (для цепной молнии)
pub(crate) fn nearest_enemy_excluding(
    enemies: &EnemyQuery,
    from: Vec2,
    max_distance: f32,
    excluded: &[Entity],
) -> Option<Entity> {
    let mut best: Option<(f32, u32, Entity)> = None;

    for (entity, transform, health, ..) in enemies.iter() {
        if excluded.contains(&entity) || !health.is_alive() {
            continue;
        }
        let distance = from.distance(transform.translation.truncate());
        if distance > max_distance {
            continue;
        }
        let key = (distance, entity.index(), entity);
        match &best {
            None => best = Some(key),
            Some((d, i, _)) => {
                if distance < *d || (distance == *d && entity.index() < *i) {
                    best = Some(key);
                }
            }
        }
    }

    best.map(|(_, _, e)| e)
}

/// Расстояние от точки до отрезка (beam width проверки)
pub(crate) fn segment_distance(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(100.0, 0.0);

        assert_eq!(segment_distance(Vec2::new(50.0, 30.0), a, b), 30.0);
        assert_eq!(segment_distance(Vec2::new(-40.0, 0.0), a, b), 40.0);
        assert_eq!(segment_distance(Vec2::new(130.0, 40.0), a, b), 50.0);
    }

    #[test]
    fn test_weapon_hit_carries_weapon_modifiers() {
        let weapon = WeaponStats::for_kind(TowerKind::RailgunEmplacement);
        let hit = weapon_hit(&weapon, weapon.damage, true);

        assert_eq!(hit.amount, 180.0);
        assert_eq!(hit.armor_pierce, 50.0);
        assert!(hit.is_critical);
        assert_eq!(hit.crit_multiplier, 2.0);
        assert_eq!(hit.vulnerability_bonus, 0.0); // Заполняется по цели
    }

    #[test]
    fn test_chain_damage_decreases_geometrically() {
        let weapon = WeaponStats::for_kind(TowerKind::PlasmaArcNode);
        let mut damage = weapon.damage;
        let mut previous = f32::INFINITY;

        for _ in 0..3 {
            damage *= 1.0 - weapon.chain_damage_reduction;
            assert!(damage < previous);
            previous = damage;
        }
        // 24 × 0.8³ = 12.288
        assert!((damage - 12.288).abs() < 1e-3);
    }
}

//! Статус-эффекты: временные, стакающиеся модификаторы
//!
//! Правила применения:
//! - stackable = false: повторное применение обновляет duration/intensity
//!   существующего экземпляра (refresh), второй не добавляется
//! - stackable = true: добавляем до max_stacks, дальше применение дропается
//!
//! Каждый тик: декремент remaining, DOT-дренаж, armor shred, синхронизация
//! slow-модификаторов в Movement; истёкшие удаляются.

use bevy::prelude::*;

use crate::combat::damage::EntityDied;
use crate::combat::Dead;
use crate::components::{Health, Movement, Regeneration};

/// Тип статус-эффекта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum StatusEffectKind {
    /// Stacking DOT от лазеров / solar lance
    Heat,
    /// Короткий стан от плазменных дуг
    Shock,
    /// Armor shred (nano)
    Corrode,
    /// Полная остановка (cryo, tier 3+)
    Freeze,
    /// Замедление + лёгкий DOT (hacking uplink)
    Hack,
    /// "Притяжение" singularity/gravity well — сильный slow
    Gravity,
    /// Stacking DOT (nanobots)
    Infection,
    Slow,
    /// Полная остановка (EMP)
    Stun,
    /// Увеличение входящего урона
    Vulnerable,
}

impl StatusEffectKind {
    /// Эффекты, держащие slow-модификатор в Movement.
    /// Интенсивность трактуется как доля замедления (0.25 → multiplier 0.75).
    pub fn is_slowing(&self) -> bool {
        matches!(
            self,
            StatusEffectKind::Slow | StatusEffectKind::Gravity | StatusEffectKind::Hack
        )
    }

    /// Эффекты, полностью останавливающие движение по пути
    pub fn is_movement_lock(&self) -> bool {
        matches!(self, StatusEffectKind::Stun | StatusEffectKind::Freeze)
    }
}

/// Описание статус-эффекта (применяется орудиями)
#[derive(Debug, Clone, Reflect)]
pub struct StatusEffect {
    pub kind: StatusEffectKind,
    pub duration: f32,
    pub intensity: f32,
    pub stackable: bool,
    pub max_stacks: u32,
    pub damage_per_second: Option<f32>,
    pub armor_reduction: Option<f32>,
    pub vulnerability_percent: Option<f32>,
}

impl StatusEffect {
    pub fn new(kind: StatusEffectKind, duration: f32, intensity: f32) -> Self {
        Self {
            kind,
            duration,
            intensity,
            stackable: false,
            max_stacks: 1,
            damage_per_second: None,
            armor_reduction: None,
            vulnerability_percent: None,
        }
    }

    pub fn stacking(mut self, max_stacks: u32) -> Self {
        self.stackable = true;
        self.max_stacks = max_stacks;
        self
    }

    pub fn with_dps(mut self, dps: f32) -> Self {
        self.damage_per_second = Some(dps);
        self
    }

    pub fn with_armor_reduction(mut self, per_second: f32) -> Self {
        self.armor_reduction = Some(per_second);
        self
    }

    pub fn with_vulnerability(mut self, percent: f32) -> Self {
        self.vulnerability_percent = Some(percent);
        self
    }
}

/// Один активный экземпляр эффекта на цели
#[derive(Debug, Clone, Reflect)]
pub struct ActiveEffect {
    pub effect: StatusEffect,
    pub remaining: f32,
}

/// Список активных эффектов на entity
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct StatusEffects {
    effects: Vec<ActiveEffect>,
}

impl StatusEffects {
    /// Применить эффект по правилам stack/refresh.
    /// Возвращает false если применение дропнуто (кап стаков).
    pub fn apply(&mut self, effect: StatusEffect) -> bool {
        if !effect.stackable {
            if let Some(existing) = self
                .effects
                .iter_mut()
                .find(|a| a.effect.kind == effect.kind && !a.effect.stackable)
            {
                // Refresh: duration и intensity обновляются, не суммируются
                existing.remaining = effect.duration;
                existing.effect = effect;
                return true;
            }
            self.effects.push(ActiveEffect {
                remaining: effect.duration,
                effect,
            });
            return true;
        }

        let stacks = self.stacks(effect.kind);
        if stacks >= effect.max_stacks as usize {
            return false; // Кап достигнут — дропаем
        }
        self.effects.push(ActiveEffect {
            remaining: effect.duration,
            effect,
        });
        true
    }

    pub fn has(&self, kind: StatusEffectKind) -> bool {
        self.effects.iter().any(|a| a.effect.kind == kind)
    }

    pub fn stacks(&self, kind: StatusEffectKind) -> usize {
        self.effects.iter().filter(|a| a.effect.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Stun/Freeze активен — движение по пути стоит
    pub fn movement_locked(&self) -> bool {
        self.effects.iter().any(|a| a.effect.kind.is_movement_lock())
    }

    /// Суммарный Vulnerable-бонус (0.25 = +25% входящего урона)
    pub fn vulnerability_bonus(&self) -> f32 {
        self.effects
            .iter()
            .filter_map(|a| a.effect.vulnerability_percent)
            .sum::<f32>()
            / 100.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    fn tick(&mut self, delta: f32) -> EffectTickTotals {
        let mut totals = EffectTickTotals::default();

        for active in &self.effects {
            if let Some(dps) = active.effect.damage_per_second {
                totals.drain += dps * delta;
            }
            if let Some(shred) = active.effect.armor_reduction {
                totals.armor_shred += shred * delta;
            }
        }

        self.effects.retain_mut(|a| {
            a.remaining -= delta;
            a.remaining > 0.0
        });

        totals
    }

    /// Комбинированные slow-множители по kind: (kind, multiplier, max remaining)
    fn slow_contributions(&self) -> Vec<(StatusEffectKind, f32, f32)> {
        let mut out: Vec<(StatusEffectKind, f32, f32)> = Vec::new();
        for active in self.effects.iter().filter(|a| a.effect.kind.is_slowing()) {
            let multiplier = (1.0 - active.effect.intensity).max(0.0);
            match out.iter_mut().find(|(k, _, _)| *k == active.effect.kind) {
                Some((_, m, remaining)) => {
                    *m *= multiplier;
                    *remaining = remaining.max(active.remaining);
                }
                None => out.push((active.effect.kind, multiplier, active.remaining)),
            }
        }
        out
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct EffectTickTotals {
    drain: f32,
    armor_shred: f32,
}

/// Событие: эффект применён к цели (хук onEffectApplied)
#[derive(Event, Debug, Clone)]
pub struct EffectApplied {
    pub entity: Entity,
    pub kind: StatusEffectKind,
}

/// Система: тик статус-эффектов
///
/// 1. DOT-дренаж и armor shred за тик
/// 2. Синхронизация slow-модификаторов в Movement (sourced, см. SpeedModifier)
/// 3. Удаление истёкших
/// 4. EntityDied если DOT добил цель
pub fn tick_status_effects(
    mut query: Query<
        (
            Entity,
            &mut StatusEffects,
            &mut Health,
            Option<&mut Movement>,
        ),
        Without<Dead>,
    >,
    time: Res<Time<Fixed>>,
    mut died_events: EventWriter<EntityDied>,
) {
    let delta = time.delta_secs();

    for (entity, mut effects, mut health, movement) in query.iter_mut() {
        if effects.is_empty() {
            continue;
        }

        // Slow-модификаторы синхронизируем ДО тика, чтобы remaining
        // модификатора не пережил сам эффект
        if let Some(mut movement) = movement {
            for (kind, multiplier, remaining) in effects.slow_contributions() {
                movement.apply_sourced_modifier(kind, multiplier, remaining.min(delta * 2.0));
            }
        }

        let totals = effects.tick(delta);

        if totals.armor_shred > 0.0 {
            health.shred_armor(totals.armor_shred);
        }

        if totals.drain > 0.0 && health.drain(totals.drain) {
            died_events.write(EntityDied {
                entity,
                killer: None,
            });
        }
    }
}

/// Система: периодическая регенерация (Regenerator, Boss, enemy_regen сложности)
pub fn regenerate_health(
    mut query: Query<(&mut Regeneration, &mut Health), Without<Dead>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut regen, mut health) in query.iter_mut() {
        regen.timer -= delta;
        while regen.timer <= 0.0 {
            health.heal(regen.amount);
            regen.timer += regen.interval;
        }
    }
}

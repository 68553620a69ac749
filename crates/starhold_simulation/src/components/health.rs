//! Health компонент: здоровье, щиты, броня, резисты
//!
//! Терминальная точка всего урона. Damage pipeline (см. `take_damage`)
//! воспроизводится строго в одном порядке — это контракт, на него
//! завязаны все архетипы орудий.
//!
//! Инварианты:
//! - 0 ≤ current ≤ max, max ≥ 1
//! - 0 ≤ shields ≤ max_shields
//! - resistance ∈ [0, 0.9] — жёсткий кап 90%, клампится в конструкторе
//! - смерть one-way и идемпотентна: повторный урон по мёртвому — no-op

use bevy::prelude::*;

use crate::combat::damage::{DamageInstance, DamageType};

/// Здоровье entity (враг или орудийная платформа)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    /// Плоское снижение урона (после armor pierce)
    pub armor: f32,
    /// Фракционное снижение урона, кап 0.9
    pub resistance: f32,
    pub shields: f32,
    pub max_shields: f32,
    dead: bool,
}

/// Результат одного применения урона
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitOutcome {
    /// Урон, дошедший до health (после щитов/брони/резистов)
    pub health_damage: f32,
    /// Урон, поглощённый щитами
    pub shield_damage: f32,
    /// true ровно один раз — на переходе к смерти
    pub died: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0, 0.0, 0.0)
    }
}

impl Health {
    pub fn new(health: f32, armor: f32, resistance: f32) -> Self {
        let max = health.max(1.0);
        Self {
            current: max,
            max,
            armor: armor.max(0.0),
            resistance: resistance.clamp(0.0, 0.9),
            shields: 0.0,
            max_shields: 0.0,
            dead: false,
        }
    }

    pub fn with_shields(mut self, amount: f32) -> Self {
        self.max_shields = amount.max(0.0);
        self.shields = self.max_shields;
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.dead && self.current > 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn health_percentage(&self) -> f32 {
        self.current / self.max
    }

    /// Damage pipeline. Порядок шагов фиксирован:
    ///
    /// 1. crit multiplier (сам roll — на стороне орудия)
    /// 2. модификаторы типа урона: Electric ×1.5 при shields > 0;
    ///    сюда же Vulnerable-бонус цели и bonus-vs-shields (pre-shield)
    /// 3. щиты поглощают первыми
    /// 4. броня (flat, после вычета pierce); минимум 1 урона, если щиты пробиты
    /// 5. resistance (фракционно)
    /// 6. вычитание из current, кламп, one-shot переход к смерти
    ///
    /// True damage пропускает шаги 4-5.
    /// Урон, полностью ушедший в щиты, не трогает health (min-1 не применяется).
    pub fn take_damage(&mut self, hit: &DamageInstance) -> HitOutcome {
        if self.dead {
            return HitOutcome::default();
        }

        let mut damage = hit.amount.max(0.0);

        // 1. Critical
        if hit.is_critical {
            damage *= hit.crit_multiplier;
        }

        // 2. Модификаторы типа урона (по состоянию щитов ДО поглощения)
        let had_shields = self.shields > 0.0;
        if hit.damage_type == DamageType::Electric && had_shields {
            damage *= 1.5;
        }
        if hit.vulnerability_bonus > 0.0 {
            damage *= 1.0 + hit.vulnerability_bonus;
        }
        if hit.bonus_vs_shields > 0.0 && had_shields {
            damage *= 1.0 + hit.bonus_vs_shields;
        }

        // 3. Щиты поглощают первыми
        let shield_damage = self.shields.min(damage);
        self.shields -= shield_damage;
        damage -= shield_damage;

        let mut health_damage = 0.0;
        if damage > 0.0 {
            if hit.damage_type != DamageType::True {
                // 4. Броня (flat), минимум 1 урона после пробития щитов
                let effective_armor = (self.armor - hit.armor_pierce).max(0.0);
                damage = (damage - effective_armor).max(1.0);

                // 5. Resistance (фракционно)
                damage *= 1.0 - self.resistance;
            }

            // 6. Применяем и клампим
            health_damage = damage;
            self.current = (self.current - damage).clamp(0.0, self.max);
        }

        let died = self.current <= 0.0 && !self.dead;
        if died {
            self.dead = true;
        }

        HitOutcome {
            health_damage,
            shield_damage,
            died,
        }
    }

    /// Прямой дренаж health (DOT-тики статус-эффектов).
    ///
    /// Намеренно мимо щитов/брони/резистов: фракционные тики с min-1 полом
    /// превращали бы любой DOT в ≥1 урона за тик.
    pub fn drain(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.current = (self.current - amount.max(0.0)).clamp(0.0, self.max);
        let died = self.current <= 0.0;
        if died {
            self.dead = true;
        }
        died
    }

    pub fn heal(&mut self, amount: f32) {
        if self.dead {
            return;
        }
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    pub fn restore_shields(&mut self, amount: f32) {
        self.shields = (self.shields + amount.max(0.0)).min(self.max_shields);
    }

    /// Снос щитов (EMP). Health не трогает.
    pub fn strip_shields(&mut self, amount: f32) {
        self.shields = (self.shields - amount.max(0.0)).max(0.0);
    }

    /// Снижение брони (Corrode-тики). Пол — 0.
    pub fn shred_armor(&mut self, amount: f32) {
        self.armor = (self.armor - amount.max(0.0)).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::damage::DamageInstance;

    fn plain_hit(amount: f32) -> DamageInstance {
        DamageInstance::new(amount, DamageType::Kinetic)
    }

    #[test]
    fn test_resistance_capped_at_construction() {
        let health = Health::new(100.0, 0.0, 5.0);
        assert_eq!(health.resistance, 0.9);

        let health = Health::new(100.0, 0.0, -1.0);
        assert_eq!(health.resistance, 0.0);
    }

    #[test]
    fn test_armor_flat_reduction() {
        // 10 урона против armor 5, resistance 0 → max(1, 10-5) = 5
        let mut health = Health::new(100.0, 5.0, 0.0);
        let outcome = health.take_damage(&plain_hit(10.0));

        assert_eq!(outcome.health_damage, 5.0);
        assert_eq!(health.current, 95.0);
    }

    #[test]
    fn test_minimum_one_damage_through_armor() {
        let mut health = Health::new(100.0, 500.0, 0.0);
        let outcome = health.take_damage(&plain_hit(10.0));

        assert_eq!(outcome.health_damage, 1.0);
        assert_eq!(health.current, 99.0);
    }

    #[test]
    fn test_shields_absorb_first() {
        // Полный щит съедает весь удар — health не тронут, min-1 не применяется
        let mut health = Health::new(100.0, 0.0, 0.0).with_shields(50.0);
        let outcome = health.take_damage(&plain_hit(30.0));

        assert_eq!(outcome.shield_damage, 30.0);
        assert_eq!(outcome.health_damage, 0.0);
        assert_eq!(health.shields, 20.0);
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_shield_overflow_hits_health() {
        let mut health = Health::new(100.0, 0.0, 0.0).with_shields(10.0);
        let outcome = health.take_damage(&plain_hit(30.0));

        assert_eq!(outcome.shield_damage, 10.0);
        assert_eq!(outcome.health_damage, 20.0);
        assert_eq!(health.shields, 0.0);
        assert_eq!(health.current, 80.0);
    }

    #[test]
    fn test_electric_bonus_vs_shields() {
        // Electric ×1.5 при наличии щитов: 20 → 30, щит 25 съедает 25, 5 в health
        let mut health = Health::new(100.0, 0.0, 0.0).with_shields(25.0);
        let outcome = health.take_damage(&DamageInstance::new(20.0, DamageType::Electric));

        assert_eq!(outcome.shield_damage, 25.0);
        assert_eq!(outcome.health_damage, 5.0);
    }

    #[test]
    fn test_electric_no_bonus_without_shields() {
        let mut health = Health::new(100.0, 0.0, 0.0);
        let outcome = health.take_damage(&DamageInstance::new(20.0, DamageType::Electric));

        assert_eq!(outcome.health_damage, 20.0);
    }

    #[test]
    fn test_resistance_fraction() {
        let mut health = Health::new(100.0, 0.0, 0.5);
        let outcome = health.take_damage(&plain_hit(40.0));

        assert_eq!(outcome.health_damage, 20.0);
        assert_eq!(health.current, 80.0);
    }

    #[test]
    fn test_crit_multiplier_applied_first() {
        // 10 × 2.0 crit = 20, затем armor 5 → 15
        let mut health = Health::new(100.0, 5.0, 0.0);
        let mut hit = plain_hit(10.0);
        hit.is_critical = true;
        hit.crit_multiplier = 2.0;
        let outcome = health.take_damage(&hit);

        assert_eq!(outcome.health_damage, 15.0);
    }

    #[test]
    fn test_armor_pierce() {
        let mut health = Health::new(100.0, 20.0, 0.0);
        let mut hit = plain_hit(30.0);
        hit.armor_pierce = 15.0;
        let outcome = health.take_damage(&hit);

        // effective armor = 20-15 = 5 → 25 урона
        assert_eq!(outcome.health_damage, 25.0);
    }

    #[test]
    fn test_true_damage_skips_armor_and_resistance() {
        let mut health = Health::new(100.0, 50.0, 0.9);
        let outcome = health.take_damage(&DamageInstance::new(30.0, DamageType::True));

        assert_eq!(outcome.health_damage, 30.0);
        assert_eq!(health.current, 70.0);
    }

    #[test]
    fn test_death_is_idempotent() {
        let mut health = Health::new(50.0, 0.0, 0.0);

        let outcome = health.take_damage(&plain_hit(100.0));
        assert!(outcome.died);
        assert!(health.is_dead());
        assert_eq!(health.current, 0.0);

        // Повторный удар по мёртвому — no-op, died не повторяется
        let outcome = health.take_damage(&plain_hit(100.0));
        assert!(!outcome.died);
        assert_eq!(outcome.health_damage, 0.0);
    }

    #[test]
    fn test_current_health_always_in_range() {
        let mut health = Health::new(100.0, 0.0, 0.0);
        health.take_damage(&plain_hit(1e9));
        assert!(health.current >= 0.0 && health.current <= health.max);

        let mut health = Health::new(100.0, 0.0, 0.0);
        health.heal(1e9);
        assert!(health.current >= 0.0 && health.current <= health.max);
    }

    #[test]
    fn test_heal_dead_is_noop() {
        let mut health = Health::new(50.0, 0.0, 0.0);
        health.take_damage(&plain_hit(100.0));

        health.heal(25.0);
        assert_eq!(health.current, 0.0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_drain_bypasses_shields() {
        let mut health = Health::new(100.0, 10.0, 0.5).with_shields(50.0);
        let died = health.drain(5.0);

        assert!(!died);
        assert_eq!(health.shields, 50.0); // Щиты не тронуты
        assert_eq!(health.current, 95.0);
    }

    #[test]
    fn test_strip_and_restore_shields() {
        let mut health = Health::new(100.0, 0.0, 0.0).with_shields(60.0);

        health.strip_shields(100.0);
        assert_eq!(health.shields, 0.0);

        health.restore_shields(200.0);
        assert_eq!(health.shields, 60.0); // Кламп к max_shields
    }
}

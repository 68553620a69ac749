//! Combat module: damage pipeline, статус-эффекты, орудия
//!
//! ECS ответственность:
//! - Game state: Health, WeaponStats, StatusEffects
//! - Combat rules: §damage pipeline, archetype dispatch, wave scaling hooks
//! - Events: DamageDealt, EntityDied, EffectApplied, WeaponFired...
//!
//! Презентационный слой (внешний):
//! - Визуал выстрелов/лучей/смертей по событиям
//! - Звук по тем же событиям
//! Симуляция обязана быть корректной при нуле подписчиков.

use bevy::prelude::*;

pub mod damage;
pub mod status;
pub mod weapon;
pub mod weapon_stats;

// Tests (отдельные файлы с _tests suffix)
#[cfg(test)]
mod weapon_tests;

// Re-export основных типов
pub use damage::{
    DamageDealt, DamageInstance, DamageType, Dead, DespawnAfter, EnemyKilled, EntityDied,
    SpawnMinions,
};
pub use status::{EffectApplied, StatusEffect, StatusEffectKind, StatusEffects};
pub use weapon::{ChargeStarted, ResourcesGenerated, WeaponFired};
pub use weapon_stats::{SupportKind, SustainedKind, TowerKind, WeaponArchetype, WeaponStats};

use crate::scheduler::{drain_action_queue, tick_pool_zones, ActionQueue};
use crate::SimSet;

/// Combat Plugin
///
/// Порядок внутри тика (через SimSet, см. lib.rs):
/// Effects → Movement → Targeting → Weapons → Scheduled → Death
///
/// Внутри Weapons: cooldown'ы → fire dispatch → support pulses.
/// Внутри Death: обработка смертей → despawn по таймауту.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий (презентационные хуки)
        app.add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<EnemyKilled>()
            .add_event::<SpawnMinions>()
            .add_event::<EffectApplied>()
            .add_event::<WeaponFired>()
            .add_event::<ChargeStarted>()
            .add_event::<ResourcesGenerated>();

        app.init_resource::<ActionQueue>();

        app.add_systems(
            FixedUpdate,
            (status::tick_status_effects, status::regenerate_health)
                .chain()
                .in_set(SimSet::Effects),
        );

        app.add_systems(
            FixedUpdate,
            (
                weapon_stats::update_weapon_cooldowns,
                weapon::fire_weapons,
                weapon::support_pulse,
            )
                .chain()
                .in_set(SimSet::Weapons),
        );

        app.add_systems(
            FixedUpdate,
            (drain_action_queue, tick_pool_zones)
                .chain()
                .in_set(SimSet::Scheduled),
        );

        app.add_systems(
            FixedUpdate,
            (damage::handle_deaths, damage::despawn_after_timeout)
                .chain()
                .in_set(SimSet::Death),
        );
    }
}

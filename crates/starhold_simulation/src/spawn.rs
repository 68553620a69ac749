//! Спавн-интерфейс: сборка entity врагов и орудийных платформ
//!
//! Внешний wave director вызывает DifficultyManager::create_enemy →
//! spawn_enemy. Ядро само волны не оркестрирует (это внешний цикл игры).

use bevy::prelude::*;

use crate::combat::{StatusEffects, TowerKind, WeaponStats};
use crate::components::{
    Emplacement, Enemy, Flying, Health, Movement, PathFollow, Regeneration, SplitOnDeath,
};
use crate::difficulty::EnemySpawnConfig;
use crate::targeting::{Targeting, TargetingMode};

/// Профиль таргетинга по типу платформы
pub fn targeting_for_kind(kind: TowerKind) -> Targeting {
    match kind {
        TowerKind::MachineGun => Targeting::new(150.0, TargetingMode::Nearest, 1).with_air(),
        TowerKind::LaserTurret => Targeting::new(180.0, TargetingMode::Nearest, 1).with_air(),
        TowerKind::RailgunEmplacement => Targeting::new(280.0, TargetingMode::Nearest, 3),
        TowerKind::PlasmaArcNode => Targeting::new(150.0, TargetingMode::Nearest, 1),
        TowerKind::MissileBattery => Targeting::new(220.0, TargetingMode::First, 2).with_air(),
        TowerKind::NanobotDispenser => Targeting::new(140.0, TargetingMode::MostClustered, 6),
        TowerKind::CryoFoamProjector => Targeting::new(130.0, TargetingMode::First, 4),
        TowerKind::GravityWellProjector => Targeting::new(180.0, TargetingMode::Nearest, 1),
        TowerKind::EmpShockTower => Targeting::new(160.0, TargetingMode::Nearest, 8).with_air(),
        TowerKind::PlasmaMortar => Targeting::new(260.0, TargetingMode::MostClustered, 1),
        TowerKind::KineticCannon => Targeting::new(200.0, TargetingMode::Strongest, 1),
        TowerKind::DroneBay => Targeting::new(160.0, TargetingMode::Weakest, 2).with_air(),
        TowerKind::ShieldProjector => Targeting::new(150.0, TargetingMode::Nearest, 1),
        TowerKind::HackingUplink => Targeting::new(170.0, TargetingMode::Strongest, 2).with_air(),
        TowerKind::ResourceHarvester => Targeting::new(0.0, TargetingMode::Nearest, 1),
        TowerKind::RepairSpire => Targeting::new(150.0, TargetingMode::Nearest, 1),
        TowerKind::SolarLanceArray => Targeting::new(400.0, TargetingMode::Furthest, 4).with_air(),
        TowerKind::SingularityCannon => {
            Targeting::new(300.0, TargetingMode::MostClustered, 1).with_air()
        }
    }
}

/// Спавн врага из конфига DifficultyManager::create_enemy
pub fn spawn_enemy(
    commands: &mut Commands,
    config: &EnemySpawnConfig,
    path: Vec<Vec2>,
) -> Entity {
    let path_follow = PathFollow::new(path, config.speed);
    let start = path_follow.start_position().unwrap_or(Vec2::ZERO);

    let mut health = Health::new(config.health, config.armor, config.resistance);
    if config.shields > 0.0 {
        health = health.with_shields(config.shields);
    }

    let mut entity = commands.spawn((
        Enemy {
            kind: config.kind,
            salvage_value: config.salvage_value,
            core_damage: config.core_damage,
        },
        health,
        Movement::new(config.speed),
        path_follow,
        StatusEffects::default(),
        Transform::from_translation(start.extend(0.0)),
    ));

    if config.flying {
        entity.insert(Flying);
    }
    if let Some((amount, interval)) = config.regeneration {
        entity.insert(Regeneration::new(amount, interval));
    }
    if let Some((count, kind)) = config.split_on_death {
        entity.insert(SplitOnDeath { count, kind });
    }

    entity.id()
}

/// Спавн орудийной платформы
///
/// Платформы несут Health (+ щиты): repair spire и shield projector
/// работают по ним, а внешняя игра может давать врагам бить башни.
pub fn spawn_emplacement(
    commands: &mut Commands,
    kind: TowerKind,
    position: Vec2,
    tier: u8,
) -> Entity {
    commands
        .spawn((
            Emplacement { kind, tier },
            WeaponStats::for_kind(kind),
            targeting_for_kind(kind),
            Health::new(200.0, 0.0, 0.0).with_shields(50.0),
            Transform::from_translation(position.extend(0.0)),
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EnemyKind;
    use crate::difficulty::DifficultyManager;
    use rand::rngs::mock::StepRng;

    fn spawn_in_world(config: &EnemySpawnConfig) -> (World, Entity) {
        let mut world = World::new();
        let entity = spawn_enemy(
            &mut world.commands(),
            config,
            vec![Vec2::ZERO, Vec2::new(100.0, 0.0)],
        );
        world.flush();
        (world, entity)
    }

    #[test]
    fn test_spawn_enemy_attaches_core_components() {
        let manager = DifficultyManager::default();
        let mut rng = StepRng::new(u64::MAX / 2, 0);
        let config = manager.create_enemy(EnemyKind::Robot, 3, &mut rng);

        let (world, entity) = spawn_in_world(&config);

        assert!(world.get::<Enemy>(entity).is_some());
        assert!(world.get::<Health>(entity).is_some());
        assert!(world.get::<Movement>(entity).is_some());
        assert!(world.get::<PathFollow>(entity).is_some());
        assert!(world.get::<StatusEffects>(entity).is_some());
        assert!(world.get::<Flying>(entity).is_none()); // Robot не летает

        // Entity стоит на старте пути
        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation.x, 0.0);
    }

    #[test]
    fn test_spawn_flying_shielded_enemy() {
        let manager = DifficultyManager::default();
        let mut rng = StepRng::new(u64::MAX / 2, 0);
        let config = manager.create_enemy(EnemyKind::Drone, 1, &mut rng);

        let (world, entity) = spawn_in_world(&config);

        assert!(world.get::<Flying>(entity).is_some());
        let health = world.get::<Health>(entity).unwrap();
        assert_eq!(health.shields, 60.0);
    }

    #[test]
    fn test_targeting_profiles_are_sane() {
        // У пирсящего railgun max_targets согласован с pierce
        let railgun = targeting_for_kind(TowerKind::RailgunEmplacement);
        assert_eq!(railgun.max_targets, 3);
        assert_eq!(railgun.mode, TargetingMode::Nearest);

        // Solar lance смотрит на дальнюю цель
        let lance = targeting_for_kind(TowerKind::SolarLanceArray);
        assert_eq!(lance.mode, TargetingMode::Furthest);
        assert!(lance.can_target_air);
    }
}

//! Tests for weapon fire dispatch (headless App, детерминированное время).
//!
//! Virtual time ставится на паузу и продвигается вручную — автоматический
//! real-time вклад обнуляется, fixed-тики считаются точно.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    use crate::combat::{StatusEffectKind, StatusEffects, TowerKind};
    use crate::components::{Enemy, EnemyKind, Health};
    use crate::difficulty::EnemySpawnConfig;
    use crate::scheduler::ActionQueue;
    use crate::{
        create_headless_app, spawn_emplacement, spawn_enemy, world_snapshot, SimulationPlugin,
    };

    fn test_app(seed: u64) -> App {
        let mut app = create_headless_app(seed);
        app.add_plugins(SimulationPlugin);
        // Детерминированное время: каждый update() продвигает Time<Real> ровно на
        // заданную длительность (по умолчанию — ноль, чтобы setup-тики не капали
        // симуляционное время), Time<Virtual>/FixedUpdate выводятся из неё.
        // Снимаем clamp max_delta, иначе крупный шаг обрезался бы до 0.25s.
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
        app.world_mut()
            .resource_mut::<Time<Virtual>>()
            .set_max_delta(Duration::from_secs(3600));
        app.update(); // Инициализация Time и ресурсов
        app
    }

    fn advance(app: &mut App, seconds: f32) {
        app.insert_resource(TimeUpdateStrategy::ManualDuration(
            Duration::from_secs_f32(seconds),
        ));
        app.update();
    }

    /// Неподвижный враг (speed 0 — стоит на старте пути)
    fn stationary_enemy(app: &mut App, position: Vec2, health: f32, shields: f32) -> Entity {
        let config = EnemySpawnConfig {
            kind: EnemyKind::Swarmer,
            health,
            speed: 0.0,
            armor: 0.0,
            resistance: 0.0,
            shields,
            regeneration: None,
            split_on_death: None,
            flying: false,
            is_elite: false,
            salvage_value: 5,
            core_damage: 1,
        };
        let entity = spawn_enemy(
            &mut app.world_mut().commands(),
            &config,
            vec![position, position + Vec2::new(1.0, 0.0)],
        );
        app.world_mut().flush();
        entity
    }

    fn enemy_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<Entity, With<Enemy>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn test_laser_kills_stationary_enemy() {
        let mut app = test_app(7);
        spawn_emplacement(
            &mut app.world_mut().commands(),
            TowerKind::LaserTurret,
            Vec2::new(0.0, 0.0),
            1,
        );
        app.world_mut().flush();
        stationary_enemy(&mut app, Vec2::new(100.0, 0.0), 50.0, 0.0);

        // 20 урона / 1.2 выстр/сек: 3 выстрела за ~2s + despawn timeout
        advance(&mut app, 4.0);

        assert_eq!(enemy_count(&mut app), 0, "enemy survived the laser");
    }

    #[test]
    fn test_out_of_range_enemy_untouched() {
        let mut app = test_app(7);
        spawn_emplacement(
            &mut app.world_mut().commands(),
            TowerKind::LaserTurret,
            Vec2::new(0.0, 0.0),
            1,
        );
        app.world_mut().flush();
        let enemy = stationary_enemy(&mut app, Vec2::new(500.0, 0.0), 50.0, 0.0);

        advance(&mut app, 2.0);

        let health = app.world().get::<Health>(enemy).unwrap();
        assert_eq!(health.current, 50.0);
    }

    #[test]
    fn test_chain_damage_decreases_along_hops() {
        let mut app = test_app(7);
        spawn_emplacement(
            &mut app.world_mut().commands(),
            TowerKind::PlasmaArcNode,
            Vec2::new(0.0, 0.0),
            1,
        );
        app.world_mut().flush();
        let first = stationary_enemy(&mut app, Vec2::new(100.0, 0.0), 1000.0, 0.0);
        let second = stationary_enemy(&mut app, Vec2::new(120.0, 0.0), 1000.0, 0.0);
        let third = stationary_enemy(&mut app, Vec2::new(140.0, 0.0), 1000.0, 0.0);

        // Ровно один выстрел (interval ~0.55s)
        advance(&mut app, 0.3);

        let damage = |e: Entity, app: &App| 1000.0 - app.world().get::<Health>(e).unwrap().current;
        let d1 = damage(first, &app);
        let d2 = damage(second, &app);
        let d3 = damage(third, &app);

        assert!(d1 > 0.0, "primary not hit");
        assert!(d2 > 0.0 && d3 > 0.0, "chain did not propagate");
        // Затухание строго геометрическое: каждый hop слабее предыдущего
        assert!(d1 > d2 && d2 > d3, "{} {} {}", d1, d2, d3);
        assert!((d2 - d1 * 0.8).abs() < 1e-3);
        assert!((d3 - d2 * 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_emp_strips_shields_and_stuns() {
        let mut app = test_app(7);
        spawn_emplacement(
            &mut app.world_mut().commands(),
            TowerKind::EmpShockTower,
            Vec2::new(0.0, 0.0),
            1,
        );
        app.world_mut().flush();
        let enemy = stationary_enemy(&mut app, Vec2::new(80.0, 0.0), 500.0, 100.0);

        advance(&mut app, 0.3);

        let health = app.world().get::<Health>(enemy).unwrap();
        assert_eq!(health.shields, 0.0, "shields not stripped");

        let effects = app.world().get::<StatusEffects>(enemy).unwrap();
        assert!(effects.has(StatusEffectKind::Stun));

        // Stun истекает (0.6s на tier 1)
        advance(&mut app, 1.0);
        let effects = app.world().get::<StatusEffects>(enemy).unwrap();
        assert!(!effects.has(StatusEffectKind::Stun));
    }

    #[test]
    fn test_singularity_collapse_survives_target_destruction() {
        let mut app = test_app(7);
        spawn_emplacement(
            &mut app.world_mut().commands(),
            TowerKind::SingularityCannon,
            Vec2::new(0.0, 0.0),
            2,
        );
        app.world_mut().flush();
        let enemy = stationary_enemy(&mut app, Vec2::new(150.0, 0.0), 10_000.0, 0.0);

        // Выстрел: pull применён, collapse запланирован на +3s
        advance(&mut app, 0.3);
        assert!(
            !app.world().resource::<ActionQueue>().is_empty(),
            "collapse not scheduled"
        );
        let effects = app.world().get::<StatusEffects>(enemy).unwrap();
        assert!(effects.has(StatusEffectKind::Gravity));
        assert!(effects.has(StatusEffectKind::Vulnerable)); // tier 2

        // Цель уничтожается ДО collapse
        app.world_mut().despawn(enemy);

        // Collapse срабатывает: без паники, без эффекта на кого-либо
        advance(&mut app, 4.0);
        assert!(app.world().resource::<ActionQueue>().is_empty());
    }

    #[test]
    fn test_mortar_strike_is_delayed() {
        let mut app = test_app(7);
        spawn_emplacement(
            &mut app.world_mut().commands(),
            TowerKind::PlasmaMortar,
            Vec2::new(0.0, 0.0),
            1,
        );
        app.world_mut().flush();
        let enemy = stationary_enemy(&mut app, Vec2::new(150.0, 0.0), 1000.0, 0.0);

        // Выстрел произошёл, но снаряд ещё летит (flight 0.8s)
        advance(&mut app, 0.4);
        let health = app.world().get::<Health>(enemy).unwrap();
        assert_eq!(health.current, 1000.0, "mortar hit before flight time");

        advance(&mut app, 1.0);
        let health = app.world().get::<Health>(enemy).unwrap();
        assert!(health.current < 1000.0, "mortar never landed");
    }

    #[test]
    fn test_enemy_reaches_core_and_despawns() {
        let mut app = test_app(7);
        let config = EnemySpawnConfig {
            kind: EnemyKind::Fast,
            health: 30.0,
            speed: 200.0,
            armor: 0.0,
            resistance: 0.0,
            shields: 0.0,
            regeneration: None,
            split_on_death: None,
            flying: false,
            is_elite: false,
            salvage_value: 8,
            core_damage: 1,
        };
        spawn_enemy(
            &mut app.world_mut().commands(),
            &config,
            vec![Vec2::ZERO, Vec2::new(200.0, 0.0)],
        );
        app.world_mut().flush();

        assert_eq!(enemy_count(&mut app), 1);
        advance(&mut app, 2.0); // 200px при 200px/s
        assert_eq!(enemy_count(&mut app), 0, "enemy did not reach the core");
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let run = |seed: u64| {
            let mut app = test_app(seed);
            spawn_emplacement(
                &mut app.world_mut().commands(),
                TowerKind::LaserTurret,
                Vec2::new(0.0, 50.0),
                3,
            );
            spawn_emplacement(
                &mut app.world_mut().commands(),
                TowerKind::PlasmaArcNode,
                Vec2::new(50.0, 0.0),
                1,
            );
            app.world_mut().flush();
            stationary_enemy(&mut app, Vec2::new(100.0, 0.0), 400.0, 50.0);
            stationary_enemy(&mut app, Vec2::new(130.0, 20.0), 400.0, 0.0);
            stationary_enemy(&mut app, Vec2::new(90.0, -30.0), 400.0, 0.0);

            advance(&mut app, 3.0);
            world_snapshot::<Health>(app.world_mut())
        };

        assert_eq!(run(1234), run(1234), "одинаковый seed разошёлся");
    }
}

//! Headless симуляция STARHOLD
//!
//! Запускает Bevy App без рендера: волна врагов против пары орудий.
//! Для проверки детерминизма и профилирования боевого ядра.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use starhold_simulation::{
    create_headless_app, spawn_emplacement, spawn_enemy, DifficultyManager, EnemyKind,
    EnemySpawnConfig, SimulationPlugin, TowerKind,
};

fn main() {
    let seed = 42;
    println!("Starting STARHOLD headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.update(); // Инициализация Time и ресурсов

    // Тестовая сцена: волна 3 по главному пути против двух орудий
    let wave = 3;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let configs: Vec<EnemySpawnConfig> = {
        let manager = app.world().resource::<DifficultyManager>();
        let count = manager.wave_enemy_count(wave).min(12);
        (0..count)
            .map(|_| manager.create_enemy(EnemyKind::Swarmer, wave, &mut rng))
            .collect()
    };

    let path = vec![
        Vec2::new(0.0, 384.0),
        Vec2::new(400.0, 384.0),
        Vec2::new(800.0, 384.0),
    ];

    {
        let world = app.world_mut();
        let mut commands = world.commands();
        spawn_emplacement(&mut commands, TowerKind::LaserTurret, Vec2::new(250.0, 300.0), 1);
        spawn_emplacement(&mut commands, TowerKind::PlasmaArcNode, Vec2::new(450.0, 450.0), 1);
        for config in &configs {
            spawn_enemy(&mut commands, config, path.clone());
        }
    }
    app.world_mut().flush();

    // Запускаем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    println!("Simulation complete!");
}

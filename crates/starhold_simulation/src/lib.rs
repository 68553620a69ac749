//! STARHOLD Simulation Core
//!
//! ECS-симуляция боевого ядра tower defense на Bevy 0.16 (strategic layer).
//!
//! Разделение ответственности:
//! - ECS = game state, targeting, damage pipeline, status effects, wave scaling
//! - Презентационный слой (рендер, звук, UI) = внешний collaborator,
//!   получает fire-and-forget события (DamageDealt, EntityDied, EffectApplied...)
//!   и обязан быть заменяем на no-op без потери корректности симуляции

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod combat;
pub mod components;
pub mod difficulty;
pub mod movement;
pub mod scheduler;
pub mod spawn;
pub mod targeting;

// Re-export базовых типов для удобства
pub use combat::{
    CombatPlugin, DamageDealt, DamageInstance, DamageType, Dead, DespawnAfter, EffectApplied,
    EntityDied, StatusEffect, StatusEffectKind, StatusEffects, TowerKind, WeaponArchetype,
    WeaponStats,
};
pub use components::*;
pub use difficulty::{
    ChallengeModifier, DifficultyConfiguration, DifficultyLevel, DifficultyManager,
    DifficultyPlugin, EnemySpawnConfig, WaveStats,
};
pub use movement::{EnemyReachedCore, MovementPlugin, PathRegistry};
pub use scheduler::{ActionQueue, ScheduledAction};
pub use spawn::{spawn_emplacement, spawn_enemy};
pub use targeting::{Targeting, TargetingMode, TargetingPlugin, TargetAcquired, TargetLost};

/// Порядок фаз одного тика симуляции (FixedUpdate)
///
/// Все системы привязаны к этим сетам и выполняются строго последовательно —
/// требование детерминизма: два орудия, стреляющие "в один тик", всегда
/// резолвятся в одном и том же порядке.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Тик статус-эффектов (DOT, armor shred, slow bookkeeping)
    Effects,
    /// Движение по путям + интеграция velocity
    Movement,
    /// Пересчёт целей (throttled, ~100ms симуляционного времени)
    Targeting,
    /// Стрельба орудий + разрешение урона
    Weapons,
    /// Отложенные действия (mortar arcs, lance charge, singularity collapse)
    Scheduled,
    /// Обработка смертей, despawn по таймауту
    Death,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG; init_resource — не перетираем seed,
            // выставленный create_headless_app
            .init_resource::<DeterministicRng>()
            // Фазы тика — единый последовательный проход
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Effects,
                    SimSet::Movement,
                    SimSet::Targeting,
                    SimSet::Weapons,
                    SimSet::Scheduled,
                    SimSet::Death,
                )
                    .chain(),
            )
            // Подсистемы (ECS strategic layer)
            .add_plugins((
                MovementPlugin,
                TargetingPlugin,
                CombatPlugin,
                DifficultyPlugin,
            ));
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Все случайные решения симуляции (crit rolls, random targeting, elite
/// spawns, proc chances) обязаны идти через этот resource — никакого
/// thread_rng, иначе replay/тесты перестают сходиться.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Snapshot компонентов мира для сравнения детерминизма
///
/// Сортировка по Entity index — итерация query недетерминирована,
/// а snapshot обязан быть воспроизводимым.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

use once_cell::sync::Lazy;
use std::sync::Mutex;

// Глобальный logger: инжектируется презентационным слоем, по умолчанию пуст.
// Симуляция обязана корректно работать вообще без logger'а.
static LOGGER: Lazy<Mutex<Option<Box<dyn LogPrinter>>>> = Lazy::new(|| Mutex::new(None));

pub static LOGGER_LEVEL: Lazy<Mutex<LogLevel>> = Lazy::new(|| Mutex::new(LogLevel::Debug));

pub fn set_logger(logger: Box<dyn LogPrinter>) {
    *LOGGER.lock().unwrap() = Some(logger);
}

pub fn set_log_level(level: LogLevel) {
    *LOGGER_LEVEL.lock().unwrap() = level;
}

pub fn set_logger_if_needed(logger: Box<dyn LogPrinter>) {
    if LOGGER.lock().unwrap().is_none() {
        set_logger(logger);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

pub trait LogPrinter: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

pub fn log_with_level(level: LogLevel, message: &str) {
    // Timestamp добавляем здесь, а не в конкретном printer'е
    if *LOGGER_LEVEL.lock().unwrap() > level {
        return;
    }
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        logger.log(level, &format!("[{}] {}", timestamp, message));
    }
}

struct ConsoleLogger;

impl LogPrinter for ConsoleLogger {
    fn log(&self, level: LogLevel, message: &str) {
        println!("[{}] {}", level.as_str(), message);
    }
}

pub fn init_logger() {
    set_logger_if_needed(Box::new(ConsoleLogger));
}

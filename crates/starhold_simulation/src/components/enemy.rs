//! Враги: типы, базовые статы, специальные способности
//!
//! Базовые статы — отправная точка; wave scaling и difficulty-множители
//! применяются поверх при спавне (см. crate::difficulty::create_enemy).

use bevy::prelude::*;

/// Тип врага
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum EnemyKind {
    Swarmer,
    Robot,
    Drone,
    BioTitan,
    /// Очень быстрый, мало здоровья
    Fast,
    /// Тяжёлая броня, медленный
    Armored,
    /// Регенерирующие щиты
    Shielded,
    /// Распадается на swarmer'ов при смерти
    Swarm,
    /// Лечится со временем
    Regenerator,
    /// Большой, живучий, с регенерацией
    Boss,
}

impl EnemyKind {
    /// Ключ типа в конфигурации (enemy composition таблицы)
    pub fn config_key(&self) -> &'static str {
        match self {
            EnemyKind::Swarmer => "swarmer",
            EnemyKind::Robot => "robot",
            EnemyKind::Drone => "drone",
            EnemyKind::BioTitan => "bio_titan",
            EnemyKind::Fast => "fast",
            EnemyKind::Armored => "armored",
            EnemyKind::Shielded => "shielded",
            EnemyKind::Swarm => "swarm",
            EnemyKind::Regenerator => "regenerator",
            EnemyKind::Boss => "boss",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        match key {
            "swarmer" => Some(EnemyKind::Swarmer),
            "robot" => Some(EnemyKind::Robot),
            "drone" => Some(EnemyKind::Drone),
            "bio_titan" => Some(EnemyKind::BioTitan),
            "fast" => Some(EnemyKind::Fast),
            "armored" => Some(EnemyKind::Armored),
            "shielded" => Some(EnemyKind::Shielded),
            "swarm" => Some(EnemyKind::Swarm),
            "regenerator" => Some(EnemyKind::Regenerator),
            "boss" => Some(EnemyKind::Boss),
            _ => None,
        }
    }
}

/// Специальная способность врага
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum SpecialAbility {
    /// Щиты при спавне
    Shielded { amount: f32 },
    /// Спавн миньонов при смерти
    SplitOnDeath { count: u32, kind: EnemyKind },
    /// Лечение amount каждые interval секунд
    Regeneration { amount: f32, interval: f32 },
}

/// Базовые статы типа врага (до wave scaling)
#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    pub health: f32,
    pub speed: f32,
    pub armor: f32,
    pub resistance: f32,
    pub salvage_value: u32,
    pub core_damage: u32,
    pub flying: bool,
    pub special: Option<SpecialAbility>,
}

/// Маркер врага + экономические поля (интерфейс к внешнему wave director'у)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Enemy {
    pub kind: EnemyKind,
    /// Награда за убийство (EnemyKilled event)
    pub salvage_value: u32,
    /// Урон станции при достижении конца пути
    pub core_damage: u32,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            kind: EnemyKind::Swarmer,
            salvage_value: 0,
            core_damage: 1,
        }
    }
}

/// Маркер летающего врага (фильтр can_target_air/ground)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Flying;

/// Периодическая регенерация здоровья
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Regeneration {
    pub amount: f32,
    pub interval: f32,
    pub timer: f32,
}

impl Default for Regeneration {
    fn default() -> Self {
        Self {
            amount: 5.0,
            interval: 1.0,
            timer: 1.0,
        }
    }
}

impl Regeneration {
    pub fn new(amount: f32, interval: f32) -> Self {
        Self {
            amount,
            interval,
            timer: interval,
        }
    }
}

/// Спавн миньонов при смерти (consumed death-системой)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct SplitOnDeath {
    pub count: u32,
    pub kind: EnemyKind,
}

impl Default for SplitOnDeath {
    fn default() -> Self {
        Self {
            count: 4,
            kind: EnemyKind::Swarmer,
        }
    }
}

/// Базовые статы по типу врага
pub fn base_stats(kind: EnemyKind) -> EnemyStats {
    match kind {
        EnemyKind::Swarmer => EnemyStats {
            health: 40.0,
            speed: 120.0,
            armor: 0.0,
            resistance: 0.0,
            salvage_value: 6,
            core_damage: 1,
            flying: false,
            special: None,
        },
        EnemyKind::Robot => EnemyStats {
            health: 150.0,
            speed: 60.0,
            armor: 5.0,
            resistance: 0.3,
            salvage_value: 12,
            core_damage: 2,
            flying: false,
            special: None,
        },
        EnemyKind::Drone => EnemyStats {
            health: 80.0,
            speed: 100.0,
            armor: 0.0,
            resistance: 0.0,
            salvage_value: 10,
            core_damage: 1,
            flying: true,
            special: Some(SpecialAbility::Shielded { amount: 60.0 }),
        },
        EnemyKind::BioTitan => EnemyStats {
            health: 1200.0,
            speed: 40.0,
            armor: 10.0,
            resistance: 0.2,
            salvage_value: 80,
            core_damage: 3,
            flying: false,
            special: Some(SpecialAbility::SplitOnDeath {
                count: 6,
                kind: EnemyKind::Swarmer,
            }),
        },
        EnemyKind::Fast => EnemyStats {
            health: 30.0,
            speed: 200.0,
            armor: 0.0,
            resistance: 0.0,
            salvage_value: 8,
            core_damage: 1,
            flying: false,
            special: None,
        },
        EnemyKind::Armored => EnemyStats {
            health: 200.0,
            speed: 40.0,
            armor: 15.0,
            resistance: 0.6,
            salvage_value: 20,
            core_damage: 2,
            flying: false,
            special: None,
        },
        EnemyKind::Shielded => EnemyStats {
            health: 100.0,
            speed: 80.0,
            armor: 2.0,
            resistance: 0.2,
            salvage_value: 15,
            core_damage: 1,
            flying: false,
            special: Some(SpecialAbility::Shielded { amount: 50.0 }),
        },
        EnemyKind::Swarm => EnemyStats {
            health: 60.0,
            speed: 100.0,
            armor: 0.0,
            resistance: 0.0,
            salvage_value: 5,
            core_damage: 1,
            flying: false,
            special: Some(SpecialAbility::SplitOnDeath {
                count: 4,
                kind: EnemyKind::Swarmer,
            }),
        },
        EnemyKind::Regenerator => EnemyStats {
            health: 120.0,
            speed: 70.0,
            armor: 3.0,
            resistance: 0.3,
            salvage_value: 18,
            core_damage: 2,
            flying: false,
            special: Some(SpecialAbility::Regeneration {
                amount: 5.0,
                interval: 1.0,
            }),
        },
        EnemyKind::Boss => EnemyStats {
            health: 1000.0,
            speed: 30.0,
            armor: 20.0,
            resistance: 0.7,
            salvage_value: 100,
            core_damage: 5,
            flying: false,
            special: Some(SpecialAbility::Regeneration {
                amount: 10.0,
                interval: 2.0,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_stats_resistance_within_cap() {
        // Ни один тип не должен запрашивать resistance выше health-капа 0.9
        for kind in [
            EnemyKind::Swarmer,
            EnemyKind::Robot,
            EnemyKind::Drone,
            EnemyKind::BioTitan,
            EnemyKind::Fast,
            EnemyKind::Armored,
            EnemyKind::Shielded,
            EnemyKind::Swarm,
            EnemyKind::Regenerator,
            EnemyKind::Boss,
        ] {
            let stats = base_stats(kind);
            assert!(stats.resistance <= 0.9, "{:?}", kind);
            assert!(stats.health >= 1.0, "{:?}", kind);
        }
    }

    #[test]
    fn test_config_key_roundtrip() {
        for kind in [EnemyKind::Swarmer, EnemyKind::BioTitan, EnemyKind::Boss] {
            assert_eq!(EnemyKind::from_config_key(kind.config_key()), Some(kind));
        }
        assert_eq!(EnemyKind::from_config_key("unknown"), None);
    }
}

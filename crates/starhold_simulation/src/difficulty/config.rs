//! Схема difficulty configuration документа (JSON)
//!
//! Загружается один раз на старте и дальше immutable. Отсутствующий или
//! битый файл — НЕ ошибка симуляции: есть компилируемые дефолты
//! (default_config), симуляция продолжает работать.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Корень документа
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DifficultyConfiguration {
    pub difficulty_levels: HashMap<String, DifficultySettings>,
    pub wave_scaling: WaveScaling,
    pub enemy_composition: EnemyComposition,
    pub boss_waves: HashMap<String, BossWaveConfig>,
    pub challenge_modifiers: HashMap<String, ChallengeModifierConfig>,
    #[serde(default)]
    pub balance_changes_for_harder_game: Option<BalanceChanges>,
    pub recommended_difficulty: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DifficultySettings {
    pub name: String,
    pub enemy_health_multiplier: f32,
    pub enemy_speed_multiplier: f32,
    pub enemy_count_multiplier: f32,
    pub enemy_spawn_rate: f32,
    pub starting_resources: u32,
    pub starting_lives: u32,
    pub resource_per_kill_multiplier: f32,
    pub wave_bonus_multiplier: f32,
    #[serde(default)]
    pub special_modifiers: Option<SpecialModifiers>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpecialModifiers {
    #[serde(default)]
    pub armor_bonus: Option<f32>,
    #[serde(default)]
    pub shield_enemies: Option<bool>,
    #[serde(default)]
    pub elite_spawn_chance: Option<f32>,
    #[serde(default)]
    pub boss_health_multiplier: Option<f32>,
    #[serde(default)]
    pub tower_cost_multiplier: Option<f32>,
    #[serde(default)]
    pub power_consumption_multiplier: Option<f32>,
    #[serde(default)]
    pub enemy_regen: Option<f32>,
    #[serde(default)]
    pub disable_selling: Option<bool>,
    #[serde(default)]
    pub random_path_switching: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaveScaling {
    pub base_enemy_count: u32,
    pub count_increase_per_wave: u32,
    /// Основание геометрического роста health: health(w) = base · k^(w−1)
    pub health_increase_per_wave: f32,
    pub speed_increase_per_wave: f32,
    pub boss_wave_interval: u32,
    pub elite_wave_start: u32,
    #[serde(default)]
    pub special_wave_modifiers: Option<Vec<WaveModifier>>,
}

/// Точечный модификатор конкретной волны ("swarm", "armor_surge"...)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaveModifier {
    pub wave: u32,
    pub modifier: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnemyComposition {
    #[serde(default)]
    pub wave_1_5: Option<HashMap<String, f32>>,
    #[serde(default)]
    pub wave_6_10: Option<HashMap<String, f32>>,
    #[serde(default)]
    pub wave_11_15: Option<HashMap<String, f32>>,
    #[serde(default)]
    pub wave_16_20: Option<HashMap<String, f32>>,
    #[serde(default)]
    pub wave_21_plus: Option<HashMap<String, f32>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BossWaveConfig {
    pub boss: String,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub elite: Option<bool>,
    pub minions: MinionsConfig,
    pub minion_count: u32,
    #[serde(default)]
    pub health_multiplier: Option<f32>,
    #[serde(default)]
    pub special: Option<String>,
}

/// Миньоны босса: список типов или один тип строкой
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MinionsConfig {
    Array(Vec<String>),
    Single(String),
}

impl MinionsConfig {
    pub fn kinds(&self) -> Vec<&str> {
        match self {
            MinionsConfig::Array(list) => list.iter().map(|s| s.as_str()).collect(),
            MinionsConfig::Single(kind) => vec![kind.as_str()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChallengeModifierConfig {
    pub name: String,
    pub description: String,
    pub score_multiplier: f32,
    #[serde(default)]
    pub tower_cost_multiplier: Option<f32>,
    #[serde(default)]
    pub power_multiplier: Option<f32>,
    #[serde(default)]
    pub range_multiplier: Option<f32>,
    #[serde(default)]
    pub speed_multiplier: Option<f32>,
    #[serde(default)]
    pub lives: Option<u32>,
    #[serde(default)]
    pub elite_only: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BalanceChanges {
    #[serde(default)]
    pub enemy_buffs: Option<EnemyBuffs>,
    #[serde(default)]
    pub tower_nerfs: Option<TowerNerfs>,
    #[serde(default)]
    pub economy_adjustments: Option<EconomyAdjustments>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnemyBuffs {
    /// Проценты: 10 = +10% к health
    #[serde(default)]
    pub base_health_increase: Option<f32>,
    #[serde(default)]
    pub base_speed_increase: Option<f32>,
    #[serde(default)]
    pub armor_scaling: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TowerNerfs {
    #[serde(default)]
    pub upgrade_cost_increase: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EconomyAdjustments {
    #[serde(default)]
    pub kill_reward_reduction: Option<f32>,
    #[serde(default)]
    pub wave_bonus_reduction: Option<f32>,
}

impl DifficultyConfiguration {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Загрузка с fallback'ом на дефолты (симуляция не падает из-за конфига)
    pub fn load_or_default(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    crate::log_info(&format!("Difficulty configuration loaded from {}", path));
                    config
                }
                Err(err) => {
                    crate::log_warning(&format!(
                        "Failed to parse difficulty configuration {}: {} — using defaults",
                        path, err
                    ));
                    Self::default_config()
                }
            },
            Err(err) => {
                crate::log_warning(&format!(
                    "Failed to read difficulty configuration {}: {} — using defaults",
                    path, err
                ));
                Self::default_config()
            }
        }
    }

    /// Компилируемые дефолты — last resort и основа для тестов
    pub fn default_config() -> Self {
        let mut difficulty_levels = HashMap::new();

        difficulty_levels.insert(
            "easy".to_string(),
            DifficultySettings {
                name: "Recruit".to_string(),
                enemy_health_multiplier: 0.8,
                enemy_speed_multiplier: 0.9,
                enemy_count_multiplier: 0.8,
                enemy_spawn_rate: 1.2,
                starting_resources: 400,
                starting_lives: 10,
                resource_per_kill_multiplier: 1.2,
                wave_bonus_multiplier: 1.2,
                special_modifiers: None,
            },
        );
        difficulty_levels.insert(
            "normal".to_string(),
            DifficultySettings {
                name: "Soldier".to_string(),
                enemy_health_multiplier: 1.0,
                enemy_speed_multiplier: 1.0,
                enemy_count_multiplier: 1.0,
                enemy_spawn_rate: 1.5,
                starting_resources: 300,
                starting_lives: 5,
                resource_per_kill_multiplier: 1.0,
                wave_bonus_multiplier: 1.0,
                special_modifiers: None,
            },
        );
        difficulty_levels.insert(
            "hard".to_string(),
            DifficultySettings {
                name: "Veteran".to_string(),
                enemy_health_multiplier: 1.3,
                enemy_speed_multiplier: 1.1,
                enemy_count_multiplier: 1.2,
                enemy_spawn_rate: 1.8,
                starting_resources: 250,
                starting_lives: 3,
                resource_per_kill_multiplier: 0.9,
                wave_bonus_multiplier: 0.9,
                special_modifiers: Some(SpecialModifiers {
                    armor_bonus: Some(5.0),
                    ..Default::default()
                }),
            },
        );
        difficulty_levels.insert(
            "nightmare".to_string(),
            DifficultySettings {
                name: "Commander".to_string(),
                enemy_health_multiplier: 1.6,
                enemy_speed_multiplier: 1.2,
                enemy_count_multiplier: 1.4,
                enemy_spawn_rate: 2.0,
                starting_resources: 200,
                starting_lives: 2,
                resource_per_kill_multiplier: 0.8,
                wave_bonus_multiplier: 0.8,
                special_modifiers: Some(SpecialModifiers {
                    armor_bonus: Some(10.0),
                    shield_enemies: Some(true),
                    elite_spawn_chance: Some(0.1),
                    boss_health_multiplier: Some(1.5),
                    ..Default::default()
                }),
            },
        );
        difficulty_levels.insert(
            "impossible".to_string(),
            DifficultySettings {
                name: "Legend".to_string(),
                enemy_health_multiplier: 2.0,
                enemy_speed_multiplier: 1.3,
                enemy_count_multiplier: 1.6,
                enemy_spawn_rate: 2.5,
                starting_resources: 150,
                starting_lives: 1,
                resource_per_kill_multiplier: 0.7,
                wave_bonus_multiplier: 0.7,
                special_modifiers: Some(SpecialModifiers {
                    armor_bonus: Some(15.0),
                    shield_enemies: Some(true),
                    elite_spawn_chance: Some(0.25),
                    boss_health_multiplier: Some(2.0),
                    enemy_regen: Some(1.0),
                    tower_cost_multiplier: Some(1.2),
                    ..Default::default()
                }),
            },
        );

        let mut boss_waves = HashMap::new();
        boss_waves.insert(
            "5".to_string(),
            BossWaveConfig {
                boss: "bio_titan".to_string(),
                count: Some(1),
                elite: None,
                minions: MinionsConfig::Single("swarmer".to_string()),
                minion_count: 6,
                health_multiplier: Some(1.0),
                special: None,
            },
        );
        boss_waves.insert(
            "10".to_string(),
            BossWaveConfig {
                boss: "boss".to_string(),
                count: Some(1),
                elite: None,
                minions: MinionsConfig::Array(vec![
                    "swarmer".to_string(),
                    "fast".to_string(),
                ]),
                minion_count: 8,
                health_multiplier: Some(1.2),
                special: None,
            },
        );
        boss_waves.insert(
            "15".to_string(),
            BossWaveConfig {
                boss: "boss".to_string(),
                count: Some(1),
                elite: Some(true),
                minions: MinionsConfig::Single("armored".to_string()),
                minion_count: 6,
                health_multiplier: Some(1.5),
                special: None,
            },
        );
        boss_waves.insert(
            "20".to_string(),
            BossWaveConfig {
                boss: "boss".to_string(),
                count: Some(2),
                elite: Some(true),
                minions: MinionsConfig::Array(vec![
                    "shielded".to_string(),
                    "regenerator".to_string(),
                ]),
                minion_count: 10,
                health_multiplier: Some(2.0),
                special: Some("twin_bosses".to_string()),
            },
        );

        let mut challenge_modifiers = HashMap::new();
        challenge_modifiers.insert(
            "no_selling".to_string(),
            ChallengeModifierConfig {
                name: "No Selling".to_string(),
                description: "Towers cannot be sold".to_string(),
                score_multiplier: 1.2,
                tower_cost_multiplier: None,
                power_multiplier: None,
                range_multiplier: None,
                speed_multiplier: None,
                lives: None,
                elite_only: None,
            },
        );
        challenge_modifiers.insert(
            "expensive_towers".to_string(),
            ChallengeModifierConfig {
                name: "Expensive Towers".to_string(),
                description: "Tower costs increased by 50%".to_string(),
                score_multiplier: 1.25,
                tower_cost_multiplier: Some(1.5),
                power_multiplier: None,
                range_multiplier: None,
                speed_multiplier: None,
                lives: None,
                elite_only: None,
            },
        );
        challenge_modifiers.insert(
            "power_shortage".to_string(),
            ChallengeModifierConfig {
                name: "Power Shortage".to_string(),
                description: "Power consumption doubled".to_string(),
                score_multiplier: 1.3,
                tower_cost_multiplier: None,
                power_multiplier: Some(2.0),
                range_multiplier: None,
                speed_multiplier: None,
                lives: None,
                elite_only: None,
            },
        );
        challenge_modifiers.insert(
            "fog_of_war".to_string(),
            ChallengeModifierConfig {
                name: "Fog of War".to_string(),
                description: "Tower range reduced".to_string(),
                score_multiplier: 1.4,
                tower_cost_multiplier: None,
                power_multiplier: None,
                range_multiplier: Some(0.8),
                speed_multiplier: None,
                lives: None,
                elite_only: None,
            },
        );
        challenge_modifiers.insert(
            "elite_forces".to_string(),
            ChallengeModifierConfig {
                name: "Elite Forces".to_string(),
                description: "All enemies are elite".to_string(),
                score_multiplier: 1.5,
                tower_cost_multiplier: None,
                power_multiplier: None,
                range_multiplier: None,
                speed_multiplier: None,
                lives: None,
                elite_only: Some(true),
            },
        );
        challenge_modifiers.insert(
            "speed_run".to_string(),
            ChallengeModifierConfig {
                name: "Speed Run".to_string(),
                description: "Enemies move twice as fast".to_string(),
                score_multiplier: 1.75,
                tower_cost_multiplier: None,
                power_multiplier: None,
                range_multiplier: None,
                speed_multiplier: Some(2.0),
                lives: None,
                elite_only: None,
            },
        );
        challenge_modifiers.insert(
            "ironman".to_string(),
            ChallengeModifierConfig {
                name: "Ironman".to_string(),
                description: "One life. No mistakes.".to_string(),
                score_multiplier: 2.0,
                tower_cost_multiplier: None,
                power_multiplier: None,
                range_multiplier: None,
                speed_multiplier: None,
                lives: Some(1),
                elite_only: None,
            },
        );

        let composition = |pairs: &[(&str, f32)]| {
            Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect::<HashMap<String, f32>>(),
            )
        };

        Self {
            difficulty_levels,
            wave_scaling: WaveScaling {
                base_enemy_count: 8,
                count_increase_per_wave: 2,
                health_increase_per_wave: 1.1,
                speed_increase_per_wave: 1.02,
                boss_wave_interval: 5,
                elite_wave_start: 8,
                special_wave_modifiers: Some(vec![
                    WaveModifier {
                        wave: 4,
                        modifier: "speed_burst".to_string(),
                        description: "Enemies move 50% faster".to_string(),
                    },
                    WaveModifier {
                        wave: 7,
                        modifier: "swarm".to_string(),
                        description: "Double enemies at half health".to_string(),
                    },
                    WaveModifier {
                        wave: 9,
                        modifier: "armor_surge".to_string(),
                        description: "+20 armor".to_string(),
                    },
                    WaveModifier {
                        wave: 13,
                        modifier: "shield_wall".to_string(),
                        description: "+10 armor".to_string(),
                    },
                ]),
            },
            enemy_composition: EnemyComposition {
                wave_1_5: composition(&[("swarmer", 0.8), ("fast", 0.2)]),
                wave_6_10: composition(&[("swarmer", 0.5), ("robot", 0.3), ("fast", 0.2)]),
                wave_11_15: composition(&[
                    ("robot", 0.4),
                    ("drone", 0.25),
                    ("armored", 0.2),
                    ("swarmer", 0.15),
                ]),
                wave_16_20: composition(&[
                    ("armored", 0.3),
                    ("shielded", 0.3),
                    ("drone", 0.2),
                    ("regenerator", 0.2),
                ]),
                wave_21_plus: composition(&[
                    ("armored", 0.3),
                    ("shielded", 0.25),
                    ("regenerator", 0.25),
                    ("swarm", 0.2),
                ]),
            },
            boss_waves,
            challenge_modifiers,
            balance_changes_for_harder_game: Some(BalanceChanges {
                enemy_buffs: Some(EnemyBuffs {
                    base_health_increase: Some(10.0),
                    base_speed_increase: Some(5.0),
                    armor_scaling: Some(2.0),
                }),
                tower_nerfs: Some(TowerNerfs {
                    upgrade_cost_increase: Some(1.15),
                }),
                economy_adjustments: Some(EconomyAdjustments {
                    kill_reward_reduction: Some(0.9),
                    wave_bonus_reduction: Some(0.9),
                }),
            }),
            recommended_difficulty: "normal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_all_levels() {
        let config = DifficultyConfiguration::default_config();
        for level in ["easy", "normal", "hard", "nightmare", "impossible"] {
            assert!(config.difficulty_levels.contains_key(level), "{}", level);
        }
    }

    #[test]
    fn test_default_config_roundtrips_through_json() {
        let config = DifficultyConfiguration::default_config();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = DifficultyConfiguration::from_json(&json).unwrap();

        assert_eq!(
            parsed.wave_scaling.health_increase_per_wave,
            config.wave_scaling.health_increase_per_wave
        );
        assert_eq!(parsed.boss_waves.len(), config.boss_waves.len());
    }

    #[test]
    fn test_minions_config_accepts_string_or_array() {
        let single: BossWaveConfig = serde_json::from_str(
            r#"{"boss": "bio_titan", "minions": "swarmer", "minion_count": 4}"#,
        )
        .unwrap();
        assert_eq!(single.minions.kinds(), vec!["swarmer"]);

        let array: BossWaveConfig = serde_json::from_str(
            r#"{"boss": "boss", "minions": ["swarmer", "fast"], "minion_count": 8}"#,
        )
        .unwrap();
        assert_eq!(array.minions.kinds(), vec!["swarmer", "fast"]);
    }

    #[test]
    fn test_malformed_json_is_err() {
        assert!(DifficultyConfiguration::from_json("{not json").is_err());
        assert!(DifficultyConfiguration::from_json("{}").is_err());
    }
}

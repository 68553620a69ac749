//! Unified weapon stats component + архетипы орудий
//!
//! Architecture Decision:
//! - Все ~16 архетипов — один компонент `WeaponStats` + sum-type
//!   `WeaponArchetype` (tagged dispatch вместо наследования)
//! - Damage math определён ОДИН раз (Health::take_damage); архетип меняет
//!   только форму "цели и эффекты", не формулы
//!
//! Rationale:
//! - Единый источник истины для weapon data
//! - Новый архетип = вариант enum + ветка в fire dispatch, без дублирования
//!   crit/pierce/armor математики
//!
//! Trade-offs:
//! - Unused поля (splash_radius у лазера и т.п.) — acceptable, несколько f32

use bevy::prelude::*;

use crate::combat::damage::DamageType;

/// Тип орудийной платформы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum TowerKind {
    // Damage
    MachineGun,
    LaserTurret,
    RailgunEmplacement,
    PlasmaArcNode,
    MissileBattery,
    NanobotDispenser,
    CryoFoamProjector,
    GravityWellProjector,
    EmpShockTower,
    PlasmaMortar,
    KineticCannon,
    // Support
    DroneBay,
    ShieldProjector,
    HackingUplink,
    ResourceHarvester,
    RepairSpire,
    // Ultimate
    SolarLanceArray,
    SingularityCannon,
}

/// Форма стрельбы архетипа (sum-type dispatch)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum WeaponArchetype {
    /// Мгновенный урон по primary target (laser, machine gun)
    Direct,
    /// Урон по до `pierce` целям вдоль линии, по дистанции от орудия
    Piercing { pierce: u32 },
    /// Цепная молния: геометрическое затухание за hop, без повторных целей
    Chaining {
        max_hops: u32,
        hop_range: f32,
        shock_chance: f32,
    },
    /// Снаряд(ы) со splash-зоной; arcing добавляет время полёта,
    /// volley > 1 — staggered запуск через scheduler
    Splash {
        arcing: bool,
        flight_delay: f32,
        volley: u32,
        volley_stagger: f32,
        leaves_pool: bool,
    },
    /// Одновременный эффект по всем currentTargets (EMP, nanobots, cryo, hack)
    Sustained(SustainedKind),
    /// Заряд, затем луч шириной beam_width до самой дальней цели
    Beam { charge_delay: f32, beam_width: f32 },
    /// Pull-эффект в радиусе, затем отложенный collapse-импульс
    PullCollapse {
        pull_radius: f32,
        collapse_delay: f32,
        collapse_radius_factor: f32,
    },
    /// Постоянная аура замедления в радиусе (gravity well)
    Aura { slow_intensity: f32 },
    /// Support-поведение без урона по врагам
    Support(SupportKind),
}

/// Разновидность sustained-эффекта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum SustainedKind {
    /// Infection DOT (+ Corrode с tier 3)
    Nanobots,
    /// Урон + Slow (+ шанс Freeze с tier 3)
    CryoFoam,
    /// Урон + снос щитов + Stun
    EmpBurst,
    /// Hack: slow + лёгкий DOT
    Hack,
}

/// Support-поведение
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum SupportKind {
    /// Восстановление щитов союзных платформ в радиусе
    ShieldProjector { amount: f32 },
    /// Лечение союзных платформ в радиусе
    RepairSpire { heal_amount: f32 },
    /// Генерация ресурсов (ResourcesGenerated events)
    ResourceHarvester { per_second: f32 },
    /// Дроны абстрагированы до лёгких kinetic-ударов по max_targets целям
    DroneBay,
}

impl WeaponArchetype {
    /// Нужна ли хотя бы одна цель для выстрела
    pub fn needs_target(&self) -> bool {
        !matches!(
            self,
            WeaponArchetype::Aura { .. }
                | WeaponArchetype::Support(
                    SupportKind::ShieldProjector { .. }
                        | SupportKind::RepairSpire { .. }
                        | SupportKind::ResourceHarvester { .. }
                )
        )
    }
}

/// Weapon stats component
///
/// ECS хранит stats и cooldown (game state); презентационный слой получает
/// WeaponFired/BeamFired события и рисует что хочет.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct WeaponStats {
    pub archetype: WeaponArchetype,
    /// Базовый урон (без модификаторов)
    pub damage: f32,
    /// Выстрелов в секунду
    pub fire_rate: f32,
    /// Текущий cooldown timer (уменьшается до 0)
    pub cooldown_timer: f32,
    pub damage_type: DamageType,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub armor_pierce: f32,
    pub bonus_vs_shields: f32,
    /// Доля затухания урона за hop цепи (0.2 → ×0.8 за hop)
    pub chain_damage_reduction: f32,
    pub splash_radius: f32,
    pub splash_damage_percent: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self::for_kind(TowerKind::LaserTurret)
    }
}

impl WeaponStats {
    fn base(archetype: WeaponArchetype, damage: f32, fire_rate: f32, ty: DamageType) -> Self {
        Self {
            archetype,
            damage,
            fire_rate,
            cooldown_timer: 0.0,
            damage_type: ty,
            crit_chance: 0.0,
            crit_multiplier: 1.5,
            armor_pierce: 0.0,
            bonus_vs_shields: 0.0,
            chain_damage_reduction: 0.2,
            splash_radius: 0.0,
            splash_damage_percent: 0.5,
        }
    }

    /// Статы по типу платформы
    pub fn for_kind(kind: TowerKind) -> Self {
        match kind {
            TowerKind::MachineGun => {
                let mut w = Self::base(WeaponArchetype::Direct, 6.0, 5.0, DamageType::Kinetic);
                w.crit_chance = 0.05;
                w
            }
            TowerKind::LaserTurret => {
                let mut w = Self::base(WeaponArchetype::Direct, 20.0, 1.2, DamageType::Laser);
                w.crit_chance = 0.1;
                w.crit_multiplier = 1.5;
                w
            }
            TowerKind::RailgunEmplacement => {
                let mut w = Self::base(
                    WeaponArchetype::Piercing { pierce: 3 },
                    180.0,
                    0.4,
                    DamageType::Kinetic,
                );
                w.armor_pierce = 50.0;
                w.crit_chance = 0.15;
                w.crit_multiplier = 2.0;
                w
            }
            TowerKind::PlasmaArcNode => Self::base(
                WeaponArchetype::Chaining {
                    max_hops: 3,
                    hop_range: 150.0,
                    shock_chance: 0.1,
                },
                24.0,
                1.8,
                DamageType::Plasma,
            ),
            TowerKind::MissileBattery => {
                let mut w = Self::base(
                    WeaponArchetype::Splash {
                        arcing: false,
                        flight_delay: 0.3,
                        volley: 1,
                        volley_stagger: 0.1,
                        leaves_pool: false,
                    },
                    45.0,
                    0.8,
                    DamageType::Explosive,
                );
                w.splash_radius = 60.0;
                w.splash_damage_percent = 0.5;
                w
            }
            TowerKind::NanobotDispenser => Self::base(
                WeaponArchetype::Sustained(SustainedKind::Nanobots),
                16.0,
                0.5,
                DamageType::Nano,
            ),
            TowerKind::CryoFoamProjector => Self::base(
                WeaponArchetype::Sustained(SustainedKind::CryoFoam),
                8.0,
                1.0,
                DamageType::Cryo,
            ),
            TowerKind::GravityWellProjector => Self::base(
                WeaponArchetype::Aura {
                    slow_intensity: 0.35,
                },
                0.0,
                0.5,
                DamageType::Gravity,
            ),
            TowerKind::EmpShockTower => {
                let mut w = Self::base(
                    WeaponArchetype::Sustained(SustainedKind::EmpBurst),
                    30.0,
                    0.33,
                    DamageType::Electric,
                );
                w.bonus_vs_shields = 0.5;
                w
            }
            TowerKind::PlasmaMortar => {
                let mut w = Self::base(
                    WeaponArchetype::Splash {
                        arcing: true,
                        flight_delay: 0.8,
                        volley: 1,
                        volley_stagger: 0.0,
                        leaves_pool: true,
                    },
                    70.0,
                    0.35,
                    DamageType::Plasma,
                );
                w.splash_radius = 80.0;
                w.splash_damage_percent = 0.6;
                w
            }
            TowerKind::KineticCannon => {
                let mut w = Self::base(WeaponArchetype::Direct, 55.0, 0.6, DamageType::Kinetic);
                w.armor_pierce = 10.0;
                w.crit_chance = 0.1;
                w.crit_multiplier = 2.0;
                w
            }
            TowerKind::DroneBay => Self::base(
                WeaponArchetype::Support(SupportKind::DroneBay),
                5.0,
                2.0,
                DamageType::Kinetic,
            ),
            TowerKind::ShieldProjector => Self::base(
                WeaponArchetype::Support(SupportKind::ShieldProjector { amount: 20.0 }),
                0.0,
                0.5,
                DamageType::Laser,
            ),
            TowerKind::HackingUplink => Self::base(
                WeaponArchetype::Sustained(SustainedKind::Hack),
                4.0,
                0.5,
                DamageType::Corrupt,
            ),
            TowerKind::ResourceHarvester => Self::base(
                WeaponArchetype::Support(SupportKind::ResourceHarvester { per_second: 2.0 }),
                0.0,
                1.0,
                DamageType::Kinetic,
            ),
            TowerKind::RepairSpire => Self::base(
                WeaponArchetype::Support(SupportKind::RepairSpire { heal_amount: 15.0 }),
                0.0,
                0.5,
                DamageType::Nano,
            ),
            TowerKind::SolarLanceArray => Self::base(
                WeaponArchetype::Beam {
                    charge_delay: 3.0,
                    beam_width: 50.0,
                },
                220.0,
                0.1,
                DamageType::Laser,
            ),
            TowerKind::SingularityCannon => Self::base(
                WeaponArchetype::PullCollapse {
                    pull_radius: 200.0,
                    collapse_delay: 3.0,
                    collapse_radius_factor: 0.5,
                },
                120.0,
                0.15,
                DamageType::Gravity,
            ),
        }
    }

    /// Интервал между выстрелами
    pub fn fire_interval(&self) -> f32 {
        1.0 / self.fire_rate
    }

    /// Может ли стрелять (cooldown == 0)
    pub fn can_fire(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    /// Начать cooldown после выстрела.
    ///
    /// Отсчёт от конца предыдущего выстрела: timer устанавливается, а не
    /// суммируется — опоздавший из-за frame jitter выстрел не копит долг
    /// больше одного пропущенного интервала.
    pub fn start_cooldown(&mut self) {
        self.cooldown_timer = self.fire_interval();
    }

    pub fn tick(&mut self, delta: f32) {
        if self.cooldown_timer > 0.0 {
            self.cooldown_timer = (self.cooldown_timer - delta).max(0.0);
        }
    }
}

/// Система: обновление weapon cooldowns
pub fn update_weapon_cooldowns(mut weapons: Query<&mut WeaponStats>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut weapon in weapons.iter_mut() {
        weapon.tick(delta);
    }
}

//! Target selection: per-tick выбор 1..N целей по приоритетному правилу
//!
//! Пересчёт целей throttled (~100ms симуляционного времени, НЕ каждый
//! frame) — это ограничивает стоимость на больших волнах. Throttle —
//! накопление elapsed time, никаких блокировок.
//!
//! Контракт одного пересчёта:
//! 1. Собрать живых врагов в радиусе
//! 2. Отфильтровать по capability (air/ground)
//! 3. Отсортировать по режиму
//! 4. Обрезать до max_targets
//! 5. Diff со старым набором → TargetAcquired / TargetLost события

use bevy::ecs::query::Has;
use bevy::prelude::*;
use rand::seq::SliceRandom;

use crate::combat::Dead;
use crate::components::{Enemy, Flying, Health, Movement, PathFollow};
use crate::{DeterministicRng, SimSet};

/// Интервал пересчёта целей (секунды симуляционного времени)
pub const TARGET_UPDATE_INTERVAL: f32 = 0.1;

/// Радиус подсчёта соседей для most/least clustered
pub const CLUSTER_RADIUS: f32 = 50.0;

/// Режим приоритизации целей
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum TargetingMode {
    /// Ближайший к орудию
    Nearest,
    /// Самый дальний (в радиусе)
    Furthest,
    /// Максимальный max health
    Strongest,
    /// Минимальный current health
    Weakest,
    /// Первый на пути (ближе всех к цели)
    First,
    /// Последний на пути
    Last,
    /// Максимальный threat score
    MostDangerous,
    /// Случайная валидная цель (через DeterministicRng)
    Random,
    /// Летающие приоритетно, затем по дистанции
    Flying,
    /// Больше всего соседей в CLUSTER_RADIUS
    MostClustered,
    /// Меньше всего соседей
    LeastClustered,
}

/// Компонент выбора целей
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Targeting {
    pub range: f32,
    pub mode: TargetingMode,
    pub max_targets: u32,
    pub can_target_air: bool,
    pub can_target_ground: bool,
    /// Опциональный obstruction-фильтр; пока pass-through
    pub requires_line_of_sight: bool,
    update_accumulator: f32,
    current_targets: Vec<Entity>,
}

impl Default for Targeting {
    fn default() -> Self {
        Self::new(100.0, TargetingMode::Nearest, 1)
    }
}

impl Targeting {
    pub fn new(range: f32, mode: TargetingMode, max_targets: u32) -> Self {
        Self {
            range,
            mode,
            max_targets,
            can_target_air: false,
            can_target_ground: true,
            requires_line_of_sight: false,
            update_accumulator: 0.0,
            current_targets: Vec::new(),
        }
    }

    pub fn with_air(mut self) -> Self {
        self.can_target_air = true;
        self
    }

    pub fn has_target(&self) -> bool {
        !self.current_targets.is_empty()
    }

    pub fn primary_target(&self) -> Option<Entity> {
        self.current_targets.first().copied()
    }

    pub fn targets(&self) -> &[Entity] {
        &self.current_targets
    }

    pub fn clear_targets(&mut self) {
        self.current_targets.clear();
    }
}

/// Событие: цель захвачена
#[derive(Event, Debug, Clone)]
pub struct TargetAcquired {
    pub emplacement: Entity,
    pub target: Entity,
}

/// Событие: цель потеряна (вышла из радиуса / умерла / вытеснена)
#[derive(Event, Debug, Clone)]
pub struct TargetLost {
    pub emplacement: Entity,
    pub target: Entity,
}

/// Снимок врага-кандидата на момент пересчёта
struct Candidate {
    entity: Entity,
    position: Vec2,
    distance: f32,
    current_health: f32,
    max_health: f32,
    max_speed: f32,
    progress: f32,
    flying: bool,
}

/// Система: throttled пересчёт целей
pub fn update_targets(
    mut emplacements: Query<(Entity, &Transform, &mut Targeting), Without<Enemy>>,
    enemies: Query<
        (
            Entity,
            &Transform,
            &Health,
            Option<&PathFollow>,
            Option<&Movement>,
            Has<Flying>,
        ),
        (With<Enemy>, Without<Dead>),
    >,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut acquired_events: EventWriter<TargetAcquired>,
    mut lost_events: EventWriter<TargetLost>,
) {
    let delta = time.delta_secs();

    // Позиции всех живых врагов — нужны для cluster score
    let enemy_positions: Vec<Vec2> = enemies
        .iter()
        .map(|(_, t, ..)| t.translation.truncate())
        .collect();

    // Сортировка по entity index: порядок пересчёта (и потребления RNG
    // режимом Random) обязан быть воспроизводимым
    let mut towers: Vec<_> = emplacements.iter_mut().collect();
    towers.sort_by_key(|(entity, ..)| entity.index());

    for (tower_entity, tower_transform, mut targeting) in towers {
        targeting.update_accumulator += delta;
        if targeting.update_accumulator < TARGET_UPDATE_INTERVAL {
            continue;
        }
        targeting.update_accumulator = 0.0;

        let origin = tower_transform.translation.truncate();

        // Живые враги в радиусе, прошедшие capability-фильтр
        let mut candidates: Vec<Candidate> = enemies
            .iter()
            .filter_map(|(entity, transform, health, path, movement, flying)| {
                if !health.is_alive() {
                    return None;
                }
                if flying && !targeting.can_target_air {
                    return None;
                }
                if !flying && !targeting.can_target_ground {
                    return None;
                }
                let position = transform.translation.truncate();
                let distance = origin.distance(position);
                if distance > targeting.range {
                    return None;
                }
                Some(Candidate {
                    entity,
                    position,
                    distance,
                    current_health: health.current,
                    max_health: health.max,
                    max_speed: movement.map(|m| m.max_speed).unwrap_or(0.0),
                    progress: path.map(|p| p.progress).unwrap_or(0.0),
                    flying,
                })
            })
            .collect();

        // requires_line_of_sight: obstruction-фильтра нет — pass-through

        sort_candidates(&mut candidates, targeting.mode, &enemy_positions, &mut rng);
        candidates.truncate(targeting.max_targets as usize);

        let new_targets: Vec<Entity> = candidates.iter().map(|c| c.entity).collect();

        // Diff со старым набором
        for &old in &targeting.current_targets {
            if !new_targets.contains(&old) {
                lost_events.write(TargetLost {
                    emplacement: tower_entity,
                    target: old,
                });
            }
        }
        for &new in &new_targets {
            if !targeting.current_targets.contains(&new) {
                acquired_events.write(TargetAcquired {
                    emplacement: tower_entity,
                    target: new,
                });
            }
        }

        targeting.current_targets = new_targets;
    }
}

fn sort_candidates(
    candidates: &mut [Candidate],
    mode: TargetingMode,
    enemy_positions: &[Vec2],
    rng: &mut DeterministicRng,
) {
    // Tie-break по entity index: float-ключи дают нестабильный порядок
    // при равенстве, а порядок целей обязан быть воспроизводим
    fn by_key(candidates: &mut [Candidate], ascending: bool, key: impl Fn(&Candidate) -> f32) {
        candidates.sort_by(|a, b| {
            let ord = key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal);
            let ord = if ascending { ord } else { ord.reverse() };
            ord.then_with(|| a.entity.index().cmp(&b.entity.index()))
        });
    }

    match mode {
        TargetingMode::Nearest => by_key(candidates, true, |c| c.distance),
        TargetingMode::Furthest => by_key(candidates, false, |c| c.distance),
        TargetingMode::Strongest => by_key(candidates, false, |c| c.max_health),
        TargetingMode::Weakest => by_key(candidates, true, |c| c.current_health),
        TargetingMode::First => by_key(candidates, false, |c| c.progress),
        TargetingMode::Last => by_key(candidates, true, |c| c.progress),
        TargetingMode::MostDangerous => by_key(candidates, false, threat_score),
        TargetingMode::Random => {
            candidates.shuffle(&mut rng.rng);
        }
        TargetingMode::Flying => {
            candidates.sort_by(|a, b| {
                b.flying
                    .cmp(&a.flying)
                    .then_with(|| {
                        a.distance
                            .partial_cmp(&b.distance)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| a.entity.index().cmp(&b.entity.index()))
            });
        }
        TargetingMode::MostClustered => {
            by_key(candidates, false, |c| cluster_score(c, enemy_positions))
        }
        TargetingMode::LeastClustered => {
            by_key(candidates, true, |c| cluster_score(c, enemy_positions))
        }
    }
}

/// Threat score для MostDangerous:
/// 0.5·current_health + 0.3·max_speed + 100·(1−progress) + max(0, 100−distance)
fn threat_score(candidate: &Candidate) -> f32 {
    0.5 * candidate.current_health
        + 0.3 * candidate.max_speed
        + 100.0 * (1.0 - candidate.progress)
        + (100.0 - candidate.distance).max(0.0)
}

/// Число других врагов в CLUSTER_RADIUS от кандидата
fn cluster_score(candidate: &Candidate, enemy_positions: &[Vec2]) -> f32 {
    enemy_positions
        .iter()
        .filter(|p| {
            let d = candidate.position.distance(**p);
            d > f32::EPSILON && d <= CLUSTER_RADIUS
        })
        .count() as f32
}

/// Targeting Plugin
pub struct TargetingPlugin;

impl Plugin for TargetingPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TargetAcquired>()
            .add_event::<TargetLost>()
            .add_systems(FixedUpdate, update_targets.in_set(SimSet::Targeting));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: u32, distance: f32, current: f32, max: f32, progress: f32) -> Candidate {
        Candidate {
            entity: Entity::from_raw(index),
            position: Vec2::new(distance, 0.0),
            distance,
            current_health: current,
            max_health: max,
            max_speed: 100.0,
            progress,
            flying: false,
        }
    }

    fn rng() -> DeterministicRng {
        DeterministicRng::new(7)
    }

    #[test]
    fn test_nearest_sorts_by_distance() {
        let mut candidates = vec![
            candidate(1, 80.0, 100.0, 100.0, 0.1),
            candidate(2, 20.0, 100.0, 100.0, 0.2),
            candidate(3, 50.0, 100.0, 100.0, 0.3),
        ];
        sort_candidates(&mut candidates, TargetingMode::Nearest, &[], &mut rng());

        let order: Vec<u32> = candidates.iter().map(|c| c.entity.index()).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_first_prefers_highest_progress() {
        let mut candidates = vec![
            candidate(1, 50.0, 100.0, 100.0, 0.2),
            candidate(2, 50.0, 100.0, 100.0, 0.9),
            candidate(3, 50.0, 100.0, 100.0, 0.5),
        ];
        sort_candidates(&mut candidates, TargetingMode::First, &[], &mut rng());

        assert_eq!(candidates[0].entity.index(), 2);
    }

    #[test]
    fn test_weakest_uses_current_health() {
        let mut candidates = vec![
            candidate(1, 50.0, 90.0, 200.0, 0.2),
            candidate(2, 50.0, 10.0, 100.0, 0.2),
        ];
        sort_candidates(&mut candidates, TargetingMode::Weakest, &[], &mut rng());
        assert_eq!(candidates[0].entity.index(), 2);

        // Strongest — по max health, не current
        let mut candidates = vec![
            candidate(1, 50.0, 90.0, 200.0, 0.2),
            candidate(2, 50.0, 10.0, 100.0, 0.2),
        ];
        sort_candidates(&mut candidates, TargetingMode::Strongest, &[], &mut rng());
        assert_eq!(candidates[0].entity.index(), 1);
    }

    #[test]
    fn test_threat_score_formula() {
        let c = candidate(1, 40.0, 100.0, 100.0, 0.25);
        // 0.5·100 + 0.3·100 + 100·0.75 + (100-40) = 50 + 30 + 75 + 60 = 215
        assert!((threat_score(&c) - 215.0).abs() < 1e-4);
    }

    #[test]
    fn test_threat_score_distance_term_floors_at_zero() {
        let c = candidate(1, 400.0, 100.0, 100.0, 0.0);
        // 50 + 30 + 100 + 0
        assert!((threat_score(&c) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_tie_break_is_stable() {
        let mut candidates = vec![
            candidate(9, 50.0, 100.0, 100.0, 0.5),
            candidate(3, 50.0, 100.0, 100.0, 0.5),
            candidate(5, 50.0, 100.0, 100.0, 0.5),
        ];
        sort_candidates(&mut candidates, TargetingMode::Nearest, &[], &mut rng());

        let order: Vec<u32> = candidates.iter().map(|c| c.entity.index()).collect();
        assert_eq!(order, vec![3, 5, 9]);
    }

    #[test]
    fn test_random_is_deterministic_per_seed() {
        let shuffle = |seed: u64| {
            let mut rng = DeterministicRng::new(seed);
            let mut candidates = vec![
                candidate(1, 10.0, 100.0, 100.0, 0.1),
                candidate(2, 20.0, 100.0, 100.0, 0.2),
                candidate(3, 30.0, 100.0, 100.0, 0.3),
                candidate(4, 40.0, 100.0, 100.0, 0.4),
            ];
            sort_candidates(&mut candidates, TargetingMode::Random, &[], &mut rng);
            candidates
                .iter()
                .map(|c| c.entity.index())
                .collect::<Vec<_>>()
        };

        assert_eq!(shuffle(42), shuffle(42));
    }

    #[test]
    fn test_cluster_score_counts_neighbours() {
        let positions = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(500.0, 0.0),
        ];
        let c = Candidate {
            entity: Entity::from_raw(1),
            position: Vec2::new(0.0, 0.0),
            distance: 0.0,
            current_health: 100.0,
            max_health: 100.0,
            max_speed: 0.0,
            progress: 0.0,
            flying: false,
        };

        // Сам кандидат (d≈0) исключён, 10 и 30 в радиусе, 500 — нет
        assert_eq!(cluster_score(&c, &positions), 2.0);
    }
}

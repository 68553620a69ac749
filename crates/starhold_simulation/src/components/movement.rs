//! Movement компоненты: скорость, speed modifiers, следование по пути
//!
//! Архитектура:
//! - `Movement` владеет списком активных speed-модификаторов (slow/haste);
//!   итоговый множитель — произведение, кламп [0.1, 2.0]
//! - `PathFollow` ведёт entity по waypoint-последовательности; progress
//!   монотонно неубывает при прямом движении, loop сбрасывает в 0
//! - системы движения живут в crate::movement (этот файл — только данные)

use bevy::prelude::*;

use crate::combat::status::StatusEffectKind;

/// Границы итогового speed multiplier
pub const SPEED_MULTIPLIER_MIN: f32 = 0.1;
pub const SPEED_MULTIPLIER_MAX: f32 = 2.0;

/// Один активный speed-модификатор
///
/// `source` помечает модификаторы, пришедшие от статус-эффектов:
/// не-стакающийся slow при повторном применении обновляет свой модификатор
/// вместо добавления второго (иначе произведение занижалось бы квадратом).
#[derive(Debug, Clone, Copy, Reflect)]
pub struct SpeedModifier {
    pub multiplier: f32,
    pub remaining: f32,
    pub source: Option<StatusEffectKind>,
}

/// Скорость и интеграция движения
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Movement {
    pub velocity: Vec2,
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    /// Произведение активных модификаторов, кламп [0.1, 2.0]. Пересчитывается
    /// при каждом изменении списка — читать, не писать.
    pub speed_multiplier: f32,
    modifiers: Vec<SpeedModifier>,
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Movement {
    pub fn new(max_speed: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            max_speed,
            acceleration: 200.0,
            deceleration: 150.0,
            speed_multiplier: 1.0,
            modifiers: Vec::new(),
        }
    }

    /// Эффективная скорость с учётом модификаторов
    pub fn effective_speed(&self) -> f32 {
        self.max_speed * self.speed_multiplier
    }

    /// Добавить анонимный модификатор (multiplier < 1 — slow, > 1 — haste)
    pub fn apply_modifier(&mut self, multiplier: f32, duration: f32) {
        self.modifiers.push(SpeedModifier {
            multiplier,
            remaining: duration,
            source: None,
        });
        self.recompute_multiplier();
    }

    /// Добавить или обновить модификатор от статус-эффекта.
    ///
    /// Для эффекта-источника всегда существует не больше одного модификатора:
    /// повторное применение обновляет multiplier и remaining (refresh).
    pub fn apply_sourced_modifier(
        &mut self,
        source: StatusEffectKind,
        multiplier: f32,
        duration: f32,
    ) {
        if let Some(existing) = self
            .modifiers
            .iter_mut()
            .find(|m| m.source == Some(source))
        {
            existing.multiplier = multiplier;
            existing.remaining = duration;
        } else {
            self.modifiers.push(SpeedModifier {
                multiplier,
                remaining: duration,
                source: Some(source),
            });
        }
        self.recompute_multiplier();
    }

    /// Тик модификаторов: декремент remaining, удаление истёкших, пересчёт
    pub fn tick_modifiers(&mut self, delta: f32) {
        self.modifiers.retain_mut(|m| {
            m.remaining -= delta;
            m.remaining > 0.0
        });
        self.recompute_multiplier();
    }

    pub fn active_modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    fn recompute_multiplier(&mut self) {
        let product: f32 = self.modifiers.iter().map(|m| m.multiplier).product();
        self.speed_multiplier = product.clamp(SPEED_MULTIPLIER_MIN, SPEED_MULTIPLIER_MAX);
    }
}

/// Результат одного шага по пути
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    /// Обычное продвижение по сегменту
    Advanced,
    /// Достигнут waypoint (индекс точки)
    WaypointReached(usize),
    /// Путь пройден до конца (loop-пути сюда не попадают — они сбрасываются)
    Completed,
    /// Entity не движется (пустой путь / уже дошёл / пауза)
    Idle,
}

/// Следование по waypoint-пути
///
/// Инвариант: progress ∈ [0, 1] монотонно неубывает при движении вперёд;
/// в loop-режиме завершение пути сбрасывает progress в 0.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PathFollow {
    points: Vec<Vec2>,
    segment: usize,
    segment_progress: f32,
    /// Суммарный прогресс по длине пути, 0..1
    pub progress: f32,
    pub move_speed: f32,
    pub rotate_towards_path: bool,
    pub loop_path: bool,
    pub moving: bool,
    total_length: f32,
    segment_lengths: Vec<f32>,
    distance_traveled: f32,
}

impl PathFollow {
    pub fn new(points: Vec<Vec2>, move_speed: f32) -> Self {
        let mut path = Self {
            points,
            move_speed,
            rotate_towards_path: true,
            ..Default::default()
        };
        path.recalculate_metrics();
        path.moving = path.points.len() > 1;
        path
    }

    /// Начальная точка пути (для установки Transform при спавне)
    pub fn start_position(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    pub fn current_waypoint(&self) -> usize {
        (self.segment + 1).min(self.points.len().saturating_sub(1))
    }

    pub fn remaining_distance(&self) -> f32 {
        (self.total_length - self.distance_traveled).max(0.0)
    }

    /// Один шаг по пути. Пишет позицию/поворот в transform.
    ///
    /// `speed_multiplier` приходит из Movement (slow/haste); stun-остановка
    /// решается выше — системой, которая просто не вызывает advance.
    pub fn advance(
        &mut self,
        transform: &mut Transform,
        delta: f32,
        speed_multiplier: f32,
    ) -> PathStep {
        if !self.moving || self.segment + 1 >= self.points.len() {
            return PathStep::Idle;
        }

        let current = self.points[self.segment];
        let next = self.points[self.segment + 1];
        let segment_length = self.segment_lengths[self.segment];

        if segment_length <= f32::EPSILON {
            // Нулевой сегмент — пропускаем
            return self.finish_segment(transform);
        }

        let move_distance = self.move_speed * speed_multiplier * delta;
        let move_amount = (move_distance / segment_length).min(1.0 - self.segment_progress);
        self.segment_progress += move_amount;
        self.distance_traveled += move_amount * segment_length;

        // Интерполяция позиции вдоль сегмента
        let position = current.lerp(next, self.segment_progress);
        transform.translation.x = position.x;
        transform.translation.y = position.y;

        if self.rotate_towards_path {
            let direction = (next - current).normalize_or_zero();
            if direction != Vec2::ZERO {
                transform.rotation = Quat::from_rotation_z(direction.y.atan2(direction.x));
            }
        }

        if self.total_length > 0.0 {
            self.progress = self.distance_traveled / self.total_length;
        }

        if self.segment_progress >= 1.0 {
            self.finish_segment(transform)
        } else {
            PathStep::Advanced
        }
    }

    fn finish_segment(&mut self, transform: &mut Transform) -> PathStep {
        self.segment += 1;
        self.segment_progress = 0.0;

        if self.segment + 1 >= self.points.len() {
            if self.loop_path && self.points.len() > 1 {
                // Сброс к началу
                self.segment = 0;
                self.distance_traveled = 0.0;
                self.progress = 0.0;
                if let Some(first) = self.points.first() {
                    transform.translation.x = first.x;
                    transform.translation.y = first.y;
                }
                PathStep::WaypointReached(0)
            } else {
                self.moving = false;
                self.progress = 1.0;
                PathStep::Completed
            }
        } else {
            PathStep::WaypointReached(self.segment)
        }
    }

    fn recalculate_metrics(&mut self) {
        self.segment_lengths.clear();
        self.total_length = 0.0;
        for pair in self.points.windows(2) {
            let length = pair[0].distance(pair[1]);
            self.segment_lengths.push(length);
            self.total_length += length;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_multiplier_product() {
        let mut movement = Movement::new(100.0);
        movement.apply_modifier(0.5, 2.0);
        movement.apply_modifier(0.8, 2.0);

        assert!((movement.speed_multiplier - 0.4).abs() < 1e-6);
        assert!((movement.effective_speed() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_speed_multiplier_clamped() {
        let mut movement = Movement::new(100.0);
        movement.apply_modifier(0.01, 2.0);
        assert_eq!(movement.speed_multiplier, SPEED_MULTIPLIER_MIN);

        let mut movement = Movement::new(100.0);
        movement.apply_modifier(5.0, 2.0);
        assert_eq!(movement.speed_multiplier, SPEED_MULTIPLIER_MAX);
    }

    #[test]
    fn test_modifiers_expire_back_to_one() {
        let mut movement = Movement::new(100.0);
        movement.apply_modifier(0.5, 1.0);
        movement.apply_modifier(0.8, 2.0);

        movement.tick_modifiers(1.5); // Первый истёк
        assert_eq!(movement.active_modifier_count(), 1);
        assert!((movement.speed_multiplier - 0.8).abs() < 1e-6);

        movement.tick_modifiers(1.0); // Все истекли
        assert_eq!(movement.active_modifier_count(), 0);
        assert_eq!(movement.speed_multiplier, 1.0);
    }

    #[test]
    fn test_sourced_modifier_refreshes_instead_of_stacking() {
        let mut movement = Movement::new(100.0);
        movement.apply_sourced_modifier(StatusEffectKind::Slow, 0.75, 2.0);
        movement.apply_sourced_modifier(StatusEffectKind::Slow, 0.75, 3.0);

        assert_eq!(movement.active_modifier_count(), 1);
        assert!((movement.speed_multiplier - 0.75).abs() < 1e-6);

        // Duration обновлён до 3s, не просуммирован до 5s
        movement.tick_modifiers(2.5);
        assert_eq!(movement.active_modifier_count(), 1);
        movement.tick_modifiers(0.6);
        assert_eq!(movement.active_modifier_count(), 0);
    }

    fn straight_path() -> PathFollow {
        PathFollow::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(100.0, 0.0),
                Vec2::new(100.0, 100.0),
            ],
            100.0,
        )
    }

    #[test]
    fn test_path_progress_monotonic() {
        let mut path = straight_path();
        let mut transform = Transform::default();

        let mut last_progress = 0.0;
        for _ in 0..50 {
            path.advance(&mut transform, 0.05, 1.0);
            assert!(path.progress >= last_progress, "progress пошёл назад");
            last_progress = path.progress;
        }
    }

    #[test]
    fn test_path_completes() {
        let mut path = straight_path();
        let mut transform = Transform::default();

        let mut completed = false;
        for _ in 0..100 {
            if path.advance(&mut transform, 0.05, 1.0) == PathStep::Completed {
                completed = true;
                break;
            }
        }

        assert!(completed);
        assert_eq!(path.progress, 1.0);
        assert!(!path.moving);
    }

    #[test]
    fn test_path_loop_resets_progress() {
        let mut path = straight_path();
        path.loop_path = true;
        let mut transform = Transform::default();

        let mut looped = false;
        for _ in 0..200 {
            let before = path.progress;
            path.advance(&mut transform, 0.05, 1.0);
            if path.progress < before {
                // Единственное допустимое уменьшение — сброс в 0 при loop
                assert_eq!(path.progress, 0.0);
                looped = true;
                break;
            }
        }

        assert!(looped, "loop-путь не сбросился");
        assert!(path.moving);
        assert_eq!(transform.translation.x, 0.0);
    }

    #[test]
    fn test_slow_multiplier_affects_travel() {
        let mut fast = straight_path();
        let mut slow = straight_path();
        let mut t1 = Transform::default();
        let mut t2 = Transform::default();

        fast.advance(&mut t1, 0.5, 1.0);
        slow.advance(&mut t2, 0.5, 0.5);

        assert!(fast.progress > slow.progress);
    }
}

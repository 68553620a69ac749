//! ECS Components боевого ядра
//!
//! Организация по доменам:
//! - health: здоровье, щиты, броня, резисты + damage pipeline
//! - movement: скорость, speed modifiers, следование по пути
//! - enemy: типы врагов, базовые статы, специальные способности
//! - emplacement: маркер орудийной платформы

pub mod emplacement;
pub mod enemy;
pub mod health;
pub mod movement;

// Re-exports для удобного импорта
pub use emplacement::*;
pub use enemy::*;
pub use health::*;
pub use movement::*;

//! Орудийная платформа (emplacement)

use bevy::prelude::*;

use crate::combat::weapon_stats::TowerKind;

/// Маркер орудийной платформы
///
/// Tier влияет на вторичные эффекты архетипов (heat на лазере с tier 3,
/// slow на railgun с tier 4 и т.д.) — см. crate::combat::weapon.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Emplacement {
    pub kind: TowerKind,
    pub tier: u8,
}

impl Default for Emplacement {
    fn default() -> Self {
        Self {
            kind: TowerKind::LaserTurret,
            tier: 1,
        }
    }
}

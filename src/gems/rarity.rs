//! Rarity classifiers for streaks and sessions

use crate::types::Rarity;

/// Rarity of a consecutive-correct streak; boundary lengths belong to the
/// higher tier
pub fn streak_rarity(length: u32) -> Rarity {
    match length {
        20.. => Rarity::Legendary,
        15..=19 => Rarity::Epic,
        10..=14 => Rarity::Rare,
        _ => Rarity::Common,
    }
}

/// Rarity of a session from its accuracy in `0.0..=1.0`
pub fn session_rarity(accuracy: f64) -> Rarity {
    if accuracy >= 0.90 {
        Rarity::Legendary
    } else if accuracy >= 0.75 {
        Rarity::Epic
    } else if accuracy >= 0.50 {
        Rarity::Rare
    } else {
        Rarity::Common
    }
}

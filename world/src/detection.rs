//! Guard/player collision checks.

use neon_heist_core::CellCoord;

/// Reports whether any guard stands on the player's cell.
#[must_use]
pub fn check_collision<I>(player: CellCoord, guards: I) -> bool
where
    I: IntoIterator<Item = CellCoord>,
{
    guards.into_iter().any(|guard| guard == player)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_requires_shared_cell() {
        let player = CellCoord::new(1, 2);
        assert!(check_collision(
            player,
            [CellCoord::new(0, 0), CellCoord::new(1, 2)]
        ));
        assert!(!check_collision(player, [CellCoord::new(1, 3)]));
        assert!(!check_collision(player, []));
    }
}

/// Material-based detectors: sacrifice

/// Sacrifice: within the first two plies the mover's material balance drops
/// by more than `margin`, yet the line either mates or ends at least `margin`
/// above where it started.
///
/// `balances` holds the mover's material balance before the played move
/// followed by the balance after each replayed ply.
pub fn sacrifice(balances: &[i32], margin: i32, ends_in_mate: bool) -> bool {
    let Some((&initial, rest)) = balances.split_first() else {
        return false;
    };
    let Some(&near_term) = rest.iter().take(2).min() else {
        return false;
    };
    if near_term >= initial - margin {
        return false;
    }
    let last = rest.last().copied().unwrap_or(initial);
    ends_in_mate || last >= initial + margin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queen_sac_into_mate() {
        // Qg8+ Rxg8 Nf7#
        assert!(sacrifice(&[820, 820, -80, -80], 200, true));
        // Same material story without the mate is just a lost queen
        assert!(!sacrifice(&[820, 820, -80, -80], 200, false));
    }

    #[test]
    fn test_material_regained_with_interest() {
        // Give up a knight, win a rook back
        assert!(sacrifice(&[0, -320, -320, 180], 150, false));
    }

    #[test]
    fn test_plain_trade_is_not_a_sacrifice() {
        assert!(!sacrifice(&[0, 330, 0, 0], 200, false));
        assert!(!sacrifice(&[0], 200, true));
        assert!(!sacrifice(&[], 200, true));
    }
}

/// The static alphabet.
///
/// Lowercase letters appear three times in the pool so they dominate the
/// noise (roughly four glyphs in five), with digits, light punctuation
/// and a non-breaking space making up the rest. Each draw has an
/// independent 10% chance of coming out upper-cased.

use rand::Rng;

const POOL: &str = "abcdefghijklmnopqrstuvwxyz\
                    abcdefghijklmnopqrstuvwxyz\
                    abcdefghijklmnopqrstuvwxyz\
                    1234567890+-!?.,\u{a0}";

const POOL_LEN: usize = 26 * 3 + 10 + 6 + 1;

/// One random glyph from the static alphabet.
pub fn random_glyph(rng: &mut impl Rng) -> char {
    let idx = rng.random_range(0..POOL_LEN);
    let ch = POOL.chars().nth(idx).unwrap_or(' ');
    if rng.random_bool(0.1) {
        ch.to_ascii_uppercase()
    } else {
        ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pool_len_matches_pool() {
        assert_eq!(POOL.chars().count(), POOL_LEN);
    }

    #[test]
    fn glyphs_come_from_the_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let g = random_glyph(&mut rng);
            let lower = g.to_ascii_lowercase();
            assert!(
                POOL.chars().any(|c| c == lower),
                "unexpected glyph {g:?}"
            );
        }
    }

    #[test]
    fn lowercase_dominates() {
        let mut rng = StdRng::seed_from_u64(42);
        let letters = (0..2000)
            .filter(|_| random_glyph(&mut rng).is_ascii_lowercase())
            .count();
        // ~78% of the pool, minus the 10% uppercase chance.
        assert!(letters > 1200, "only {letters} lowercase of 2000");
    }
}

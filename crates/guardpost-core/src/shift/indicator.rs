//! Daily indicator passphrases.
//!
//! Each shift gets a randomized two-word phrase at creation time, spoken by
//! the guard at check-in so dispatch can verify the guard is not under
//! duress. The phrase is immutable for the life of the shift.

use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "brisk", "calm", "cedar", "clear", "copper", "crimson", "dusty", "golden", "granite",
    "hollow", "iron", "ivory", "lunar", "misty", "northern", "olive", "pale", "quiet", "rapid",
    "ruby", "silent", "silver", "steady",
];

const NOUNS: &[&str] = &[
    "anchor", "badge", "beacon", "bridge", "canyon", "compass", "condor", "eagle", "ember",
    "falcon", "harbor", "hawk", "lantern", "maple", "meadow", "otter", "raven", "river", "saddle",
    "sparrow", "summit", "tunnel", "walnut", "willow",
];

/// Pick a two-word phrase from the fixed word lists.
pub fn generate(rng: &mut impl Rng) -> String {
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    format!("{adjective} {noun}")
}

/// Pick a phrase using the thread-local generator.
pub fn generate_default() -> String {
    generate(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn phrase_is_two_known_words() {
        let phrase = generate_default();
        let words: Vec<&str> = phrase.split(' ').collect();
        assert_eq!(words.len(), 2);
        assert!(ADJECTIVES.contains(&words[0]));
        assert!(NOUNS.contains(&words[1]));
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate(&mut Pcg64::seed_from_u64(42));
        let b = generate(&mut Pcg64::seed_from_u64(42));
        assert_eq!(a, b);
    }
}

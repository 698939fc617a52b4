//! Mod flags, grounded on `bancho/constants.py::Mods`. A 31-bit set plus
//! composite aliases the reference client derives from combinations of the
//! base flags.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Mods: u32 {
        const NO_MOD        = 0;
        const NO_FAIL       = 1 << 0;
        const EASY          = 1 << 1;
        const TOUCH_SCREEN  = 1 << 2;
        const HIDDEN        = 1 << 3;
        const HARD_ROCK     = 1 << 4;
        const SUDDEN_DEATH  = 1 << 5;
        const DOUBLE_TIME   = 1 << 6;
        const RELAX         = 1 << 7;
        const HALF_TIME     = 1 << 8;
        const NIGHTCORE     = 1 << 9;
        const FLASHLIGHT    = 1 << 10;
        const AUTOPLAY      = 1 << 11;
        const SPUN_OUT      = 1 << 12;
        const AUTOPILOT     = 1 << 13;
        const PERFECT       = 1 << 14;
        const KEY4          = 1 << 15;
        const KEY5          = 1 << 16;
        const KEY6          = 1 << 17;
        const KEY7          = 1 << 18;
        const KEY8          = 1 << 19;
        const FADE_IN       = 1 << 20;
        const RANDOM        = 1 << 21;
        const CINEMA        = 1 << 22;
        const TARGET        = 1 << 23;
        const KEY9          = 1 << 24;
        const KEY_COOP      = 1 << 25;
        const KEY1          = 1 << 26;
        const KEY3          = 1 << 27;
        const KEY2          = 1 << 28;
        const SCORE_V2      = 1 << 29;
        const MIRROR        = 1 << 30;
    }
}

impl Mods {
    pub const SCORE_INCREASE_MODS: Mods = Mods::HIDDEN
        .union(Mods::HARD_ROCK)
        .union(Mods::DOUBLE_TIME)
        .union(Mods::FLASHLIGHT)
        .union(Mods::FADE_IN);

    pub const KEY_MOD: Mods = Mods::KEY1
        .union(Mods::KEY2)
        .union(Mods::KEY3)
        .union(Mods::KEY4)
        .union(Mods::KEY5)
        .union(Mods::KEY6)
        .union(Mods::KEY7)
        .union(Mods::KEY8)
        .union(Mods::KEY9)
        .union(Mods::KEY_COOP);

    pub const FREE_MOD_ALLOWED: Mods = Mods::NO_FAIL
        .union(Mods::EASY)
        .union(Mods::HIDDEN)
        .union(Mods::HARD_ROCK)
        .union(Mods::SUDDEN_DEATH)
        .union(Mods::FLASHLIGHT)
        .union(Mods::FADE_IN)
        .union(Mods::RELAX)
        .union(Mods::AUTOPILOT)
        .union(Mods::SPUN_OUT)
        .union(Mods::KEY_MOD);

    /// Every individual flag this set carries an acronym for, in bit
    /// order, e.g. `HIDDEN | DOUBLE_TIME` -> `["HD", "DT"]`. Composite
    /// aliases (`SCORE_INCREASE_MODS`, `KEY_MOD`, `FREE_MOD_ALLOWED`) are
    /// never themselves emitted, matching the exclusion list in
    /// `bancho/constants.py::Mods.acronyms`.
    pub fn acronyms(self) -> Vec<&'static str> {
        const TABLE: &[(Mods, &str)] = &[
            (Mods::NO_FAIL, "NF"),
            (Mods::EASY, "EZ"),
            (Mods::TOUCH_SCREEN, "TD"),
            (Mods::HIDDEN, "HD"),
            (Mods::HARD_ROCK, "HR"),
            (Mods::SUDDEN_DEATH, "SD"),
            (Mods::DOUBLE_TIME, "DT"),
            (Mods::RELAX, "RX"),
            (Mods::HALF_TIME, "HT"),
            (Mods::NIGHTCORE, "NC"),
            (Mods::FLASHLIGHT, "FL"),
            (Mods::AUTOPLAY, "AT"),
            (Mods::SPUN_OUT, "SO"),
            (Mods::AUTOPILOT, "AP"),
            (Mods::PERFECT, "PF"),
            (Mods::KEY4, "K4"),
            (Mods::KEY5, "K5"),
            (Mods::KEY6, "K6"),
            (Mods::KEY7, "K7"),
            (Mods::KEY8, "K8"),
            (Mods::FADE_IN, "FI"),
            (Mods::RANDOM, "RD"),
            (Mods::CINEMA, "CN"),
            (Mods::TARGET, "TP"),
            (Mods::KEY9, "K9"),
            (Mods::KEY_COOP, "KC"),
            (Mods::KEY1, "K1"),
            (Mods::KEY3, "K3"),
            (Mods::KEY2, "K2"),
            (Mods::SCORE_V2, "V2"),
            (Mods::MIRROR, "MR"),
        ];

        TABLE
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, acronym)| *acronym)
            .collect()
    }

    /// Single-flag convenience over [`acronyms`](Self::acronyms); a
    /// composite value collapses to the first set flag's acronym (or
    /// `""` if none are set).
    pub fn acronym(self) -> &'static str {
        self.acronyms().first().copied().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_increase_mods_contains_hidden_and_double_time() {
        assert!(Mods::SCORE_INCREASE_MODS.contains(Mods::HIDDEN));
        assert!(Mods::SCORE_INCREASE_MODS.contains(Mods::DOUBLE_TIME));
        assert!(!Mods::SCORE_INCREASE_MODS.contains(Mods::RELAX));
    }

    #[test]
    fn acronyms_for_composites() {
        assert_eq!(Mods::HIDDEN.acronyms(), vec!["HD"]);
        assert_eq!(
            (Mods::HIDDEN | Mods::DOUBLE_TIME).acronyms(),
            vec!["HD", "DT"]
        );
    }

    #[test]
    fn acronym_takes_first_set_flag() {
        assert_eq!(Mods::HIDDEN.acronym(), "HD");
        assert_eq!((Mods::HIDDEN | Mods::DOUBLE_TIME).acronym(), "HD");
        assert_eq!(Mods::NO_MOD.acronym(), "");
    }
}

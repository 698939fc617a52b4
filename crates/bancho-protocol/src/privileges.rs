//! Player privilege flags, grounded on `bancho/constants.py::Privileges`.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Privileges: u8 {
        const RESTRICTED = 0;
        const NORMAL     = 1 << 0;
        const BAT         = 1 << 1;
        const SUPPORTER  = 1 << 2;
        const PEPPY       = 1 << 3;
        const ADMIN       = 1 << 4;
        const TOURNAMENT  = 1 << 5;
    }
}

impl Privileges {
    pub fn is_restricted(self) -> bool {
        !self.contains(Privileges::NORMAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_has_no_normal_bit() {
        assert!(Privileges::RESTRICTED.is_restricted());
        assert!(!Privileges::NORMAL.is_restricted());
    }
}

use serde::{Deserialize, Serialize};

use crate::InvalidActionError;

/// Player input for one step, as independent flags.
///
/// Several flags may be set at once. The session applies them in field order:
/// left, right, rotate, speed-up, hold.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub move_left: bool,
    pub move_right: bool,
    pub rotate: bool,
    /// Switches gravity to the fast cadence until the piece locks.
    pub speed_up: bool,
    pub hold: bool,
}

impl Action {
    /// Number of flags in the vector form.
    pub const LEN: usize = 5;

    pub const NONE: Self = Self {
        move_left: false,
        move_right: false,
        rotate: false,
        speed_up: false,
        hold: false,
    };
    pub const MOVE_LEFT: Self = Self {
        move_left: true,
        ..Self::NONE
    };
    pub const MOVE_RIGHT: Self = Self {
        move_right: true,
        ..Self::NONE
    };
    pub const ROTATE: Self = Self {
        rotate: true,
        ..Self::NONE
    };
    pub const SPEED_UP: Self = Self {
        speed_up: true,
        ..Self::NONE
    };
    pub const HOLD: Self = Self {
        hold: true,
        ..Self::NONE
    };

    /// Parses the vector form `[left, right, rotate, speed_up, hold]`.
    ///
    /// # Example
    ///
    /// ```
    /// use rltris_engine::Action;
    ///
    /// let action = Action::from_flags(&[0, 0, 1, 0, 0]).unwrap();
    /// assert_eq!(action, Action::ROTATE);
    /// assert!(Action::from_flags(&[0, 1]).is_err());
    /// ```
    pub fn from_flags(flags: &[u8]) -> Result<Self, InvalidActionError> {
        let flags: &[u8; Self::LEN] =
            flags.try_into().map_err(|_| InvalidActionError::WrongArity {
                expected: Self::LEN,
                actual: flags.len(),
            })?;
        let mut bits = [false; Self::LEN];
        for (index, (&value, bit)) in flags.iter().zip(&mut bits).enumerate() {
            *bit = match value {
                0 => false,
                1 => true,
                _ => return Err(InvalidActionError::NotAFlag { index, value }),
            };
        }
        let [move_left, move_right, rotate, speed_up, hold] = bits;
        Ok(Self {
            move_left,
            move_right,
            rotate,
            speed_up,
            hold,
        })
    }

    #[must_use]
    pub fn to_flags(self) -> [u8; Self::LEN] {
        [
            self.move_left,
            self.move_right,
            self.rotate,
            self.speed_up,
            self.hold,
        ]
        .map(u8::from)
    }

    /// The action with only flag `index` set, as chosen by an argmax policy.
    #[must_use]
    pub fn one_hot(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::MOVE_LEFT),
            1 => Some(Self::MOVE_RIGHT),
            2 => Some(Self::ROTATE),
            3 => Some(Self::SPEED_UP),
            4 => Some(Self::HOLD),
            _ => None,
        }
    }
}

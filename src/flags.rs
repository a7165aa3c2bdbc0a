use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Binding behaviour switches. The empty set is a one-way binding with an
    /// initial assignment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BindFlag: u32 {
        /// Propagate changes from the left side back to the right side.
        const TWO_WAY = 0b0001;
        /// Assign once, then release every subscription.
        const ONE_TIME = 0b0010;
        /// Skip the evaluation performed at construction.
        const NO_INITIAL_TRIGGER = 0b1000;
    }
}

impl BindFlag {
    pub fn is_two_way(self) -> bool {
        self.contains(BindFlag::TWO_WAY)
    }

    pub fn is_one_time(self) -> bool {
        self.contains(BindFlag::ONE_TIME)
    }

    pub fn has_initial_trigger(self) -> bool {
        !self.contains(BindFlag::NO_INITIAL_TRIGGER)
    }
}

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Logical movement requests collected over one input-polling period.
    ///
    /// Several flags may be set at once (for example both walk directions);
    /// the motion update decides precedence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MotionIntent: u8 {
        const JUMP        = 1 << 0;
        const DOUBLE_JUMP = 1 << 1;
        const WALK_LEFT   = 1 << 2;
        const WALK_RIGHT  = 1 << 3;
        const SLAM        = 1 << 4;
        /// Debug-only free flight.
        const FLY         = 1 << 5;
    }
}

impl Default for MotionIntent {
    fn default() -> Self {
        Self::empty()
    }
}

impl MotionIntent {
    /// Return the accumulated intents and reset to none.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::empty())
    }

    pub fn walking(self) -> bool {
        self.intersects(Self::WALK_LEFT | Self::WALK_RIGHT)
    }
}

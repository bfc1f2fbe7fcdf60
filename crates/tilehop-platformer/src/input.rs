use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tilehop_core::intent::MotionIntent;

use crate::level::LevelCommand;

/// Logical input actions, independent of the physical keys bound to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Jump,
    DoubleJump,
    Slam,
    WalkLeft,
    WalkRight,
    Fly,
    Suicide,
    Reset,
    Pause,
    NextLevel,
}

/// When an action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Every frame while a bound key is down.
    Held,
    /// Only on the frame a bound key goes down.
    Pressed,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::Jump,
        Action::DoubleJump,
        Action::Slam,
        Action::WalkLeft,
        Action::WalkRight,
        Action::Fly,
        Action::Suicide,
        Action::Reset,
        Action::Pause,
        Action::NextLevel,
    ];

    pub fn trigger(self) -> Trigger {
        match self {
            Action::Jump | Action::Slam | Action::WalkLeft | Action::WalkRight | Action::Fly => {
                Trigger::Held
            },
            Action::DoubleJump
            | Action::Suicide
            | Action::Reset
            | Action::Pause
            | Action::NextLevel => Trigger::Pressed,
        }
    }

    /// Motion intent this action contributes, if any.
    pub fn intent(self) -> Option<MotionIntent> {
        Some(match self {
            Action::Jump => MotionIntent::JUMP,
            Action::DoubleJump => MotionIntent::DOUBLE_JUMP,
            Action::Slam => MotionIntent::SLAM,
            Action::WalkLeft => MotionIntent::WALK_LEFT,
            Action::WalkRight => MotionIntent::WALK_RIGHT,
            Action::Fly => MotionIntent::FLY,
            _ => return None,
        })
    }

    /// Fly is a debugging aid and never fires in release builds, whatever
    /// the bindings say.
    pub fn is_enabled(self) -> bool {
        self != Action::Fly || cfg!(debug_assertions)
    }

    /// Level command this action issues, if any.
    pub fn command(self) -> Option<LevelCommand> {
        Some(match self {
            Action::Suicide => LevelCommand::Suicide,
            Action::Reset => LevelCommand::Reset,
            Action::Pause => LevelCommand::Pause,
            Action::NextLevel => LevelCommand::NextLevel,
            _ => return None,
        })
    }
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|k| k.to_string()).collect()
}

/// Key names bound to each action, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub jump: Vec<String>,
    pub double_jump: Vec<String>,
    pub slam: Vec<String>,
    pub walk_left: Vec<String>,
    pub walk_right: Vec<String>,
    pub fly: Vec<String>,
    pub suicide: Vec<String>,
    pub reset: Vec<String>,
    pub pause: Vec<String>,
    pub next_level: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            jump: keys(&["W", "Up", "K"]),
            double_jump: keys(&["W", "Up", "K"]),
            slam: keys(&["S", "Down", "J"]),
            walk_left: keys(&["A", "Left", "H"]),
            walk_right: keys(&["D", "Right", "L"]),
            fly: if cfg!(debug_assertions) { keys(&["F"]) } else { Vec::new() },
            suicide: keys(&["X"]),
            reset: keys(&["R"]),
            pause: keys(&["Escape"]),
            next_level: keys(&["Enter", "Space"]),
        }
    }
}

impl KeyBindings {
    pub fn keys(&self, action: Action) -> &[String] {
        match action {
            Action::Jump => &self.jump,
            Action::DoubleJump => &self.double_jump,
            Action::Slam => &self.slam,
            Action::WalkLeft => &self.walk_left,
            Action::WalkRight => &self.walk_right,
            Action::Fly => &self.fly,
            Action::Suicide => &self.suicide,
            Action::Reset => &self.reset,
            Action::Pause => &self.pause,
            Action::NextLevel => &self.next_level,
        }
    }

    pub fn keys_mut(&mut self, action: Action) -> &mut Vec<String> {
        match action {
            Action::Jump => &mut self.jump,
            Action::DoubleJump => &mut self.double_jump,
            Action::Slam => &mut self.slam,
            Action::WalkLeft => &mut self.walk_left,
            Action::WalkRight => &mut self.walk_right,
            Action::Fly => &mut self.fly,
            Action::Suicide => &mut self.suicide,
            Action::Reset => &mut self.reset,
            Action::Pause => &mut self.pause,
            Action::NextLevel => &mut self.next_level,
        }
    }

    /// Every action bound to `key`.
    pub fn actions_for(&self, key: &str) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| self.keys(*a).iter().any(|k| k.eq_ignore_ascii_case(key)))
            .collect()
    }
}

/// Keyboard state for one frame: keys down and keys that went down this frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    down: BTreeSet<String>,
    pressed: BTreeSet<String>,
}

impl KeyState {
    /// Advance to a new frame in which exactly `down` are held. Keys not
    /// held in the previous frame count as pressed.
    pub fn advance<I, S>(&mut self, down: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now: BTreeSet<String> = down
            .into_iter()
            .map(|k| k.as_ref().to_ascii_lowercase())
            .collect();
        self.pressed = now.difference(&self.down).cloned().collect();
        self.down = now;
    }

    pub fn is_down(&self, key: &str) -> bool {
        self.down.contains(&key.to_ascii_lowercase())
    }

    pub fn was_pressed(&self, key: &str) -> bool {
        self.pressed.contains(&key.to_ascii_lowercase())
    }
}

/// Everything the input layer produced for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub intents: MotionIntent,
    pub commands: Vec<LevelCommand>,
}

/// Turns raw key state into intents and commands using the bindings.
///
/// Owned by the host; nothing here is global.
#[derive(Debug, Clone, Default)]
pub struct InputAggregator {
    bindings: KeyBindings,
}

impl InputAggregator {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Actions active this frame, in declaration order.
    pub fn active(&self, keys: &KeyState) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| a.is_enabled())
            .filter(|a| {
                let bound = self.bindings.keys(*a);
                match a.trigger() {
                    Trigger::Held => bound.iter().any(|k| keys.is_down(k)),
                    Trigger::Pressed => bound.iter().any(|k| keys.was_pressed(k)),
                }
            })
            .collect()
    }

    pub fn poll(&self, keys: &KeyState) -> FrameInput {
        let mut input = FrameInput::default();
        for action in self.active(keys) {
            if let Some(intent) = action.intent() {
                input.intents |= intent;
            }
            if let Some(command) = action.command() {
                input.commands.push(command);
            }
        }
        input
    }
}

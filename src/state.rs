//! Operating mode and transition handling

use tracing::{error, info};

/// Operating phase gating what a cycle does with a received frame
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Calibrating,
    Recording,
    Terminating,
}

impl Mode {
    /// Wire codes accepted over the control boundary
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Mode::Calibrating),
            1 => Some(Mode::Recording),
            99 => Some(Mode::Terminating),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Calibrating => "calibration",
            Mode::Recording => "recording",
            Mode::Terminating => "termination",
        }
    }
}

/// Outcome reported back over the control boundary
#[derive(Clone, Debug)]
pub struct TransitionReply {
    pub success: bool,
    pub info: String,
}

/// Owns the current mode; all mutation goes through `request`
pub struct ModeMachine {
    mode: Mode,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self {
            mode: Mode::Calibrating,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Apply one transition request.
    ///
    /// A request for the current mode is a no-op success. An unknown code
    /// is rejected and the machine falls back to `Calibrating` rather than
    /// holding its previous mode.
    pub fn request(&mut self, target: u8) -> TransitionReply {
        match Mode::from_code(target) {
            Some(mode) if mode == self.mode => {
                info!("in state: {}", self.mode.label());
                TransitionReply {
                    success: true,
                    info: "No transition needed!".to_owned(),
                }
            }
            Some(mode) => {
                self.mode = mode;
                info!("changed to state: {}", mode.label());
                TransitionReply {
                    success: true,
                    info: "OK".to_owned(),
                }
            }
            None => {
                error!(
                    "wrong transition ({}), reverting to state: {}",
                    target,
                    Mode::Calibrating.label()
                );
                self.mode = Mode::Calibrating;
                TransitionReply {
                    success: false,
                    info: "Undefined state".to_owned(),
                }
            }
        }
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

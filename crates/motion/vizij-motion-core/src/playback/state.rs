use std::fmt;

use serde::{Deserialize, Serialize};

/// Playback state of a single animation or group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// Created but not started, or cancelled.
    #[default]
    Idle,
    /// Advancing with the frame clock.
    Running,
    /// Time is held.
    Paused,
    /// Reached the end; the final keyframe has been committed.
    Finished,
}

impl PlaybackState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if `play` would move time forward from here
    #[inline]
    pub fn can_play(&self) -> bool {
        !matches!(self, Self::Running)
    }

    #[inline]
    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Running | Self::Idle)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for PlaybackState {
    fn from(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "finished" => Self::Finished,
            _ => Self::Idle,
        }
    }
}

//! Volume handling
//!
//! Session volume is a linear multiplier in `0.0..=2.0` (0% to 200%).
//! The live resource carries its own [`VolumeControl`] so changes apply to the
//! track that is currently playing.

use std::sync::atomic::{AtomicU32, Ordering};

/// Highest multiplier a session accepts (200%)
pub const MAX_MULTIPLIER: f32 = 2.0;

/// Recorded session volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    multiplier: f32,
}

impl Volume {
    /// Volume from the constructor percent argument
    ///
    /// The multiplier is rounded to the nearest integer, so 100 gives 1.0,
    /// 149 gives 1.0 and 150 gives 2.0.
    pub fn from_initial_percent(percent: f32) -> Self {
        Self {
            multiplier: clamp_multiplier(percent / 100.0).round(),
        }
    }

    /// Set volume from a percentage
    ///
    /// Values in `0..=200` map to `percent / 100`. Anything else, negative
    /// values included, is taken as 200%.
    pub fn set_percent(&mut self, percent: f32) {
        self.multiplier = clamp_multiplier(percent / 100.0);
    }

    /// Linear multiplier (0.0 - 2.0)
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Volume in percent, rounded
    pub fn percent(&self) -> u32 {
        to_percent(self.multiplier)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

fn clamp_multiplier(multiplier: f32) -> f32 {
    if (0.0..=MAX_MULTIPLIER).contains(&multiplier) {
        multiplier
    } else {
        MAX_MULTIPLIER
    }
}

/// Convert a multiplier to a rounded percentage
pub fn to_percent(multiplier: f32) -> u32 {
    (multiplier * 100.0).round() as u32
}

/// Mutable volume of a playing resource
///
/// Shared between the session (which sets it) and the sink (which applies it
/// to the audio it renders).
pub trait VolumeControl: Send + Sync {
    /// Set the linear multiplier (0.0 - 2.0)
    fn set_volume(&self, multiplier: f32);

    /// Current linear multiplier
    fn volume(&self) -> f32;

    /// Scale interleaved samples in place by the current multiplier
    ///
    /// Sinks that render PCM themselves call this on every decoded buffer of
    /// the resource.
    fn apply(&self, buffer: &mut [f32]) {
        let gain = self.volume();

        if gain == 0.0 {
            buffer.fill(0.0);
        } else if gain != 1.0 {
            for sample in buffer.iter_mut() {
                *sample *= gain;
            }
        }
    }
}

/// Lock-free inline volume for a single resource
#[derive(Debug)]
pub struct InlineVolume {
    bits: AtomicU32,
}

impl InlineVolume {
    pub fn new(multiplier: f32) -> Self {
        Self {
            bits: AtomicU32::new(multiplier.to_bits()),
        }
    }
}

impl Default for InlineVolume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl VolumeControl for InlineVolume {
    fn set_volume(&self, multiplier: f32) {
        self.bits.store(multiplier.to_bits(), Ordering::Relaxed);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zoom — content scale held as whole quarter steps so repeated adjustment
// never drifts.

use std::fmt;

use serde::{Deserialize, Serialize};

const MIN_QUARTERS: u8 = 2;
const MAX_QUARTERS: u8 = 8;
const ONE_QUARTERS: u8 = 4;

/// Content scale in [0.5, 2.0], step 0.25.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scale(u8);

impl Scale {
    pub const MIN: Self = Self(MIN_QUARTERS);
    pub const MAX: Self = Self(MAX_QUARTERS);
    pub const ONE: Self = Self(ONE_QUARTERS);

    /// Scale from a count of quarter steps, clamped into range.
    pub fn from_quarters(quarters: u8) -> Self {
        Self(quarters.clamp(MIN_QUARTERS, MAX_QUARTERS))
    }

    pub fn quarters(self) -> u8 {
        self.0
    }

    pub fn factor(self) -> f32 {
        f32::from(self.0) / 4.0
    }

    /// One step larger; a no-op at the upper bound.
    pub fn zoom_in(self) -> Self {
        Self::from_quarters(self.0.saturating_add(1))
    }

    /// One step smaller; a no-op at the lower bound.
    pub fn zoom_out(self) -> Self {
        Self::from_quarters(self.0.saturating_sub(1))
    }

    pub fn can_zoom_in(self) -> bool {
        self < Self::MAX
    }

    pub fn can_zoom_out(self) -> bool {
        self > Self::MIN
    }

    /// Toolbar label, e.g. `"125%"`.
    pub fn percent_label(self) -> String {
        format!("{}%", u32::from(self.0) * 25)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.percent_label())
    }
}

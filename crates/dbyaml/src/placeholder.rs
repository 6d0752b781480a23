//! The commented-out production database line.
//!
//! Rails generates `production:` with its database path commented out. The
//! line is activated before parsing so the production environment renders the
//! same way the file spells it, and commented again in every rendering.

use alloc::borrow::Cow;

pub const COMMENTED: &str = "# database: path/to/persistent/storage/production.sqlite3";
pub const UNCOMMENTED: &str = "database: path/to/persistent/storage/production.sqlite3";

/// Whether the loader activated the placeholder line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placeholder {
    active: bool,
}

impl Placeholder {
    /// Uncomment the placeholder line wherever it occurs.
    pub fn activate(text: &str) -> (Cow<'_, str>, Self) {
        if text.contains(COMMENTED) {
            (
                Cow::Owned(text.replace(COMMENTED, UNCOMMENTED)),
                Self { active: true },
            )
        } else {
            (Cow::Borrowed(text), Self::default())
        }
    }

    pub fn is_active(self) -> bool {
        self.active
    }

    /// Comment the placeholder line again in a rendering.
    ///
    /// Only applies when [`activate`](Self::activate) changed the input, so a
    /// file that really sets this path keeps it.
    pub fn restore(self, rendered: String) -> String {
        if self.active && rendered.contains(UNCOMMENTED) {
            rendered.replace(UNCOMMENTED, COMMENTED)
        } else {
            rendered
        }
    }
}

//! # Stamp Rule
//!
//! Stamps are earned per visit from the services rendered, independent of
//! price or duration:
//!
//! | Services                       | Stamps |
//! |--------------------------------|--------|
//! | any haircut                    | 1      |
//! | any haircut + beard            | 2      |
//! | beard / eyebrows only, nothing | 0      |

use crate::{BEARD, HAIRCUT_CODES};

/// Stamps earned for one order's services. At most 2.
pub fn stamps_for<S: AsRef<str>>(services: &[S]) -> u32 {
    let has_haircut = services
        .iter()
        .any(|s| HAIRCUT_CODES.contains(&s.as_ref()));
    let has_beard = services.iter().any(|s| s.as_ref() == BEARD);

    match (has_haircut, has_beard) {
        (true, true) => 2,
        (true, false) => 1,
        (false, _) => 0,
    }
}

//! Model-output file name decomposition.
//!
//! Model-output files are named `<round_id>-<team>-<model>` where the round id
//! is a `YYYY-MM-DD` date. The name is split on `-` from the right, so the
//! hyphens inside the date are preserved. Team and model identifiers cannot
//! contain hyphens themselves: any name with more than four hyphens is
//! rejected rather than guessed at.

use std::{fmt, str::FromStr};

use snafu::ensure;

use crate::error::{FilenameFormatSnafu, TransformError, TransformResult};

/// Separator between round id, team and model.
pub const SEPARATOR: char = '-';

/// Most separators a valid name can hold: two inside the date, two between parts.
pub const MAX_SEPARATORS: usize = 4;

/// Round, team and model parsed from a model-output file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelOutputFileName {
    /// Round identifier (`YYYY-MM-DD`).
    pub round_id: String,
    /// Team identifier.
    pub team: String,
    /// Model identifier.
    pub model: String,
}

impl ModelOutputFileName {
    /// Parse a base name (no extension) into its parts.
    pub fn parse(file_name: &str) -> TransformResult<Self> {
        let separators = file_name.matches(SEPARATOR).count();
        ensure!(
            separators <= MAX_SEPARATORS,
            FilenameFormatSnafu {
                file_name,
                reason: format!("{separators} separators, at most {MAX_SEPARATORS} allowed"),
            }
        );

        let mut parts: Vec<&str> = file_name.rsplitn(3, SEPARATOR).collect();
        parts.reverse();
        let [round_id, team, model] = parts.as_slice() else {
            return FilenameFormatSnafu {
                file_name,
                reason: "expected <round_id>-<team>-<model>",
            }
            .fail();
        };

        ensure!(
            is_round_date(round_id),
            FilenameFormatSnafu {
                file_name,
                reason: format!("round id {round_id:?} is not a YYYY-MM-DD date"),
            }
        );

        Ok(Self {
            round_id: round_id.to_string(),
            team: team.to_string(),
            model: model.to_string(),
        })
    }
}

impl FromStr for ModelOutputFileName {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelOutputFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.round_id, self.team, self.model)
    }
}

/// `^\d{4}-\d{2}-\d{2}$` over ASCII digits. Only the shape is checked.
fn is_round_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

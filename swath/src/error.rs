use crate::C;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwathError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid {name} {value}: {reason}")]
    Parameter {
        name: &'static str,
        value: C,
        reason: &'static str,
    },

    #[error("invalid threshold [{min}, {max}]")]
    Threshold { min: C, max: C },

    #[error("angular range {start}..{end} must satisfy 0 <= start < end <= 360")]
    AngularRange { start: C, end: C },

    #[error("minimum {criterion} {min} unreachable at bearing {bearing}: radius too small or threshold too strict")]
    ThresholdUnreachable {
        criterion: &'static str,
        min: C,
        bearing: C,
    },

    #[error("{name} {value} outside [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: C,
        min: C,
        max: C,
    },

    #[error("empty swath profile")]
    EmptySwath,

    #[error("swath generation cancelled")]
    Cancelled,
}

/// Rejects zero, negative and NaN values.
pub(crate) fn positive(name: &'static str, value: C) -> Result<C, SwathError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(SwathError::Parameter {
            name,
            value,
            reason: "must be positive",
        })
    }
}

/// Rejects values that are not finite and positive.
pub(crate) fn finite_positive(name: &'static str, value: C) -> Result<C, SwathError> {
    if value.is_finite() {
        positive(name, value)
    } else {
        Err(SwathError::Parameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}

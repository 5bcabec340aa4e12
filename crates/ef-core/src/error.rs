use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Curve for {what} has {len} frames (expected {expected})")]
    CurveLength {
        what: String,
        len: usize,
        expected: usize,
    },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Unknown profile: {key}")]
    UnknownProfile { key: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

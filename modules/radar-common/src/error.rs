use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadarError {
    #[error("Validation error: {0}")]
    Validation(String),
}

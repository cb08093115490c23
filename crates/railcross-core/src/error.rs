use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid gate calibration: open {open}% must be below closed {closed}%")]
    InvalidCalibration { open: f32, closed: f32 },

    // Collaborator errors
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(String),

    #[error("Hardware operation failed: {0}")]
    Hardware(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

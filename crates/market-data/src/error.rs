use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("No valid bars in {0}")]
    Empty(String),
}

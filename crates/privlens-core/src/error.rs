use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid tag key (expected <CONTAINER>:<field>): {0}")]
    InvalidTagKey(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

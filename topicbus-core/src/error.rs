use thiserror::Error;

pub type Result<T, E = BusError> = core::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("topic name {0:?} is invalid, a topic needs at least one non-whitespace character")]
    InvalidTopic(String),
}

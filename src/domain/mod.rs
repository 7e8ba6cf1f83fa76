use thiserror::Error;

pub mod todo;
pub mod user;
pub mod validation;

#[cfg(test)]
pub mod test_util;

/// Errors returned from driven ports which distinguish "nothing matched" from a real failure
#[derive(Error, Debug)]
pub enum DrivenPortError {
    #[error("a communication failure occurred: {0}")]
    CommsFailure(#[from] anyhow::Error),
    #[error("the requested data does not exist")]
    DoesNotExist,
}

/// Raised when a caller asks to patch a column that isn't patchable or supplies a value
/// the column's rule rejects
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum PatchError {
    #[error("the column \"{0}\" cannot be patched")]
    UnknownColumn(String),
    #[error("the value supplied for \"{0}\" is invalid")]
    InvalidValue(&'static str),
}

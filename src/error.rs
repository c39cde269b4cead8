use super::session::Persona;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field '{0}' is missing or blank")]
    MissingField(&'static str),
    #[error("{0} is not allowed to perform this action")]
    NotPermitted(Persona),
    #[error("a material number is required to close a request")]
    MissingMaterialNumber,
    #[error("request was already completed by IMA")]
    AlreadyCompleted,
    #[error("email to IMA was already sent for this request")]
    EmailAlreadySent,
    #[error("no material request found with id {0}")]
    UnknownRequest(String),
    #[error("page {page} is out of range, only {total_pages} page(s) available")]
    PageOutOfRange { page: usize, total_pages: usize },
    #[error("page size must be greater than zero")]
    InvalidPageSize,
    #[error("not signed in")]
    NotAuthenticated,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no material request found with id {0}")]
    NotFound(String),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Db(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] minicbor::encode::Error<std::convert::Infallible>),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
}

/// Everything a service operation can fail with. Validation failures are
/// surfaced before any store call is attempted; store failures leave the
/// local record set untouched.
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

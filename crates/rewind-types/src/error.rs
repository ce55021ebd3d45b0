/// Errors produced when constructing foundation types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("document id must not be empty")]
    EmptyId,

    #[error("document identity field `{0}` is not a string")]
    NonStringId(String),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadBalanceError {
    /// The caller passed an empty candidate set.
    #[error("no available candidate for selection")]
    EmptyCandidates,
    /// `hash.nodes` must be a positive multiple of 4.
    #[error("hash.nodes must be a positive multiple of 4, got {0}")]
    MisconfiguredHashNodes(i64),
}

use thiserror::Error;

/// Faults surfaced by the upstream fetch pipeline.
///
/// The fetch layer never retries or swallows these. Callers decide what a
/// failure means: the startup fetch propagates and exits, background
/// refetches log and leave the current view in place.
#[derive(Debug, Error)]
pub enum PokedexError {
    /// The upstream API could not be reached, or answered with a
    /// non-success status.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The response parsed as JSON but did not have the expected shape.
    #[error("upstream response malformed: {0}")]
    UpstreamMalformed(String),

    /// A species resource URL did not end in a positive numeric id.
    #[error("invalid species id in resource url: {0}")]
    InvalidId(String),

    /// The upstream affirmed there is no Pokémon with this id.
    #[error("no pokemon with id {0}")]
    NotFound(u32),
}

impl From<reqwest::Error> for PokedexError {
    fn from(err: reqwest::Error) -> Self {
        PokedexError::UpstreamUnavailable(err.to_string())
    }
}

pub mod openai;
pub mod traits;

pub use traits::{CompletionProvider, CompletionRequest};

/// Why a dispatch attempt failed. One variant per user-distinguishable
/// failure; the CLI renders these inline and never retries.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{provider} rejected the API key (401). Run `streamsage key set` with a valid key.")]
    Auth { provider: &'static str },
    #[error("{provider} quota exhausted (402). Check your billing settings.")]
    PaymentRequired { provider: &'static str },
    #[error("{provider} rate limit hit (429). Wait a moment and try again.")]
    RateLimited { provider: &'static str },
    #[error("{provider} API error {status}: {detail}")]
    Api {
        provider: &'static str,
        status: u16,
        detail: String,
    },
    #[error("network error talking to {provider}: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned no choices")]
    EmptyReply { provider: &'static str },
}

/// Map a non-success HTTP response onto the dispatch error taxonomy,
/// consuming the body for the detail text.
pub(crate) async fn api_error(
    provider: &'static str,
    response: reqwest::Response,
) -> DispatchError {
    let status = response.status().as_u16();
    match status {
        401 => DispatchError::Auth { provider },
        402 => DispatchError::PaymentRequired { provider },
        429 => DispatchError::RateLimited { provider },
        _ => {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            DispatchError::Api {
                provider,
                status,
                detail,
            }
        }
    }
}

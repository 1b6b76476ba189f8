//! Prefill plus autoregressive decode loop.

use tracing::{debug, warn};

use crate::engine::{DecodeSession, InferenceModel, Vocabulary};
use crate::error::GenerateError;
use crate::request::GenerationRequest;

/// Why the decode loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// End-of-generation token sampled.
    Stop,
    /// Reached `max_tokens`.
    Length,
    /// A single-token decode failed; output holds everything appended so far.
    DecodeError,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Length => write!(f, "length"),
            Self::DecodeError => write!(f, "decode_error"),
        }
    }
}

/// Successful outcome of [`generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Prompt text followed by the generated continuation.
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub finish_reason: FinishReason,
}

/// Run one generation session against `model`.
///
/// The session (context and sampler chain) lives only inside this call and
/// is dropped on every return path.
pub fn generate<M: InferenceModel>(
    model: &M,
    request: &GenerationRequest,
) -> Result<Generation, GenerateError> {
    let vocab = model.vocab();

    let prompt_tokens = match vocab.tokenize(&request.prompt) {
        Ok(tokens) if !tokens.is_empty() => tokens,
        Ok(_) => {
            warn!("Prompt produced no tokens");
            return Err(GenerateError::TokenizationFailed);
        }
        Err(e) => {
            warn!("Prompt tokenization failed: {e}");
            return Err(GenerateError::TokenizationFailed);
        }
    };
    let n_prompt = prompt_tokens.len();

    if !request.fits_prompt(n_prompt) {
        warn!(
            n_prompt,
            n_ctx = request.context_size,
            "Prompt does not fit the requested context"
        );
        return Err(GenerateError::ContextInitFailed);
    }

    let params = request.session_params(n_prompt);
    let mut session = model
        .new_session(&params, &request.sampler_config())
        .map_err(|e| {
            warn!("{e}");
            GenerateError::ContextInitFailed
        })?;

    //  Prompt processing
    if let Err(e) = session.decode(&prompt_tokens) {
        warn!(n_prompt, "Prompt decode failed: {e}");
        return Err(GenerateError::DecodeFailed);
    }

    // Bytes, so characters split across tokens are rejoined before decoding.
    let mut output = request.prompt.clone().into_bytes();
    let mut completion_tokens = 0usize;
    let mut finish_reason = FinishReason::Length;

    //  Token generation loop
    for _ in 0..request.max_tokens {
        let token = session.sample();

        if vocab.is_eog(token) {
            finish_reason = FinishReason::Stop;
            break;
        }

        output.extend_from_slice(&vocab.token_to_piece(token));
        completion_tokens += 1;

        if let Err(e) = session.decode(&[token]) {
            warn!(completion_tokens, "Decode step failed, returning partial output: {e}");
            finish_reason = FinishReason::DecodeError;
            break;
        }
    }

    debug!(
        n_prompt,
        completion_tokens,
        %finish_reason,
        "Generation finished"
    );

    Ok(Generation {
        text: String::from_utf8_lossy(&output).into_owned(),
        prompt_tokens: n_prompt,
        completion_tokens,
        finish_reason,
    })
}

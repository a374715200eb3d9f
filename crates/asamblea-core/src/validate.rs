//! Pre-network input validation.
//!
//! Validation failures surface as inline messages and block the request
//! entirely — no network call is made for input the backend would reject.
//! Messages are user-facing and therefore in Spanish, matching the product.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{NewQuestion, QuestionType, VoteAnswer};

/// `torre-apto` access code shape, checked after normalization.
static ACCESS_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-\d+$").expect("static pattern"));

/// A user-input rejection. Never reaches the network.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Access code does not match `torre-apto`.
    #[error("Código inválido. Usa el formato torre-apto, por ejemplo 1-201")]
    BadAccessCode,
    /// A required field is empty.
    #[error("El campo '{0}' es obligatorio")]
    EmptyField(&'static str),
    /// Multiple-choice question with fewer than two options.
    #[error("Las preguntas de selección múltiple requieren al menos 2 opciones")]
    TooFewOptions,
    /// `max_selections` outside `1..=options`.
    #[error("max_selections debe estar entre 1 y el número de opciones")]
    BadMaxSelections,
    /// More options selected than the question allows.
    #[error("No puede seleccionar más de {0} opciones")]
    TooManySelections(u32),
    /// Empty answer.
    #[error("Selecciona al menos una opción")]
    EmptyAnswer,
}

/// Uppercase and strip everything outside `[0-9-]`.
#[must_use]
pub fn normalize_access_code(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Normalize and check an access code. Returns the normalized form.
pub fn check_access_code(raw: &str) -> Result<String, ValidationError> {
    let code = normalize_access_code(raw);
    if ACCESS_CODE.is_match(&code) {
        Ok(code)
    } else {
        Err(ValidationError::BadAccessCode)
    }
}

/// Client-side mirror of the backend's question-creation rules.
pub fn check_new_question(question: &NewQuestion) -> Result<(), ValidationError> {
    if question.text.trim().is_empty() {
        return Err(ValidationError::EmptyField("texto"));
    }
    match question.question_type {
        QuestionType::YesNo => Ok(()),
        QuestionType::Multiple => {
            let options = question.options.as_deref().unwrap_or_default();
            if options.len() < 2 {
                return Err(ValidationError::TooFewOptions);
            }
            if question.allow_multiple {
                let max = question.max_selections;
                if max < 1 || max as usize > options.len() {
                    return Err(ValidationError::BadMaxSelections);
                }
            }
            Ok(())
        }
    }
}

/// Check an answer against a question's selection rules before voting.
pub fn check_answer(answer: &VoteAnswer, allow_multiple: bool, max_selections: u32) -> Result<(), ValidationError> {
    if answer.is_empty() {
        return Err(ValidationError::EmptyAnswer);
    }
    let limit = if allow_multiple { max_selections.max(1) } else { 1 };
    if answer.len() > limit as usize {
        return Err(ValidationError::TooManySelections(limit));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

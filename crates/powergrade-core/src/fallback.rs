//! Secondary-model extraction fallback.
//!
//! When the pattern cascade finds nothing, the same extraction problem can be
//! handed to another language model. This module builds the prompt, parses
//! the short reply, and throttles calls; the network client itself is a
//! collaborator behind [`CompletionClient`].

use std::cell::Cell;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::FallbackConfig;
use crate::domain::AnswerKind;

/// One completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub prompt: &'a str,
}

/// A text-completion service.
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> anyhow::Result<String>;
}

/// Something that can recover an answer the cascade missed.
pub trait AnswerFallback {
    /// The answer for `field` in `text`, or `None` when none can be recovered.
    fn extract(&self, text: &str, field: &str, kind: AnswerKind) -> Option<f64>;
}

/// Fallback that asks a secondary model for the number.
pub struct SecondaryExtractor<C> {
    client: C,
    config: FallbackConfig,
    calls: Cell<usize>,
}

impl<C: CompletionClient> SecondaryExtractor<C> {
    pub fn new(client: C, config: FallbackConfig) -> Self {
        Self {
            client,
            config,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn throttle(&self) {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);
        let delay = self.config.batch_delay();
        if self.config.batch_size > 0 && calls % self.config.batch_size == 0 && !delay.is_zero() {
            debug!(calls, delay_ms = self.config.batch_delay_ms, "fallback throttle");
            std::thread::sleep(delay);
        }
    }
}

impl<C: CompletionClient> AnswerFallback for SecondaryExtractor<C> {
    fn extract(&self, text: &str, field: &str, kind: AnswerKind) -> Option<f64> {
        let prompt = build_prompt(text, field, kind, self.config.max_response_chars);
        let request = CompletionRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            prompt: &prompt,
        };
        let reply = self.client.complete(&request);
        self.throttle();

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                warn!(field, error = %e, "fallback completion failed");
                return None;
            }
        };
        match parse_reply(&reply) {
            Some(value) => Some(normalize(kind, value)),
            None => {
                debug!(field, reply = %truncate(&reply, 100), "fallback reply has no number");
                None
            }
        }
    }
}

fn expected_type(kind: AnswerKind) -> &'static str {
    match kind {
        AnswerKind::Power => "a decimal between 0 and 1",
        AnswerKind::EffectSize => "a decimal effect size (standardized, such as Cohen's d)",
        AnswerKind::PerGroup | AnswerKind::Total | AnswerKind::Events => {
            "an integer (sample size or count)"
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// The extraction prompt sent to the secondary model.
pub fn build_prompt(text: &str, field: &str, kind: AnswerKind, max_chars: usize) -> String {
    let label = field.replace('_', " ");
    format!(
        "Extract the single numerical answer from this response to a statistical power analysis question.\n\
         \n\
         The question asked for: {label}\n\
         Expected answer type: {expected}\n\
         \n\
         Response:\n\
         {body}\n\
         \n\
         Extract ONLY the final recommended numerical value for {label}. \
         If the response gives a per-group number and the question asks for a per-group value, give the per-group number. \
         If it asks for a total, give the total.\n\
         \n\
         Respond with ONLY the number, nothing else.",
        expected = expected_type(kind),
        body = truncate(text, max_chars),
    )
}

static BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9][0-9,]*(?:\.[0-9]+)?$").expect("valid bare-number pattern")
});

static LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:answer|value|result)\s*(?:is|=|:)\s*(-?[0-9][0-9,]*(?:\.[0-9]+)?)")
        .expect("valid labelled-number pattern")
});

static FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?[0-9][0-9,]*(?:\.[0-9]+)?").expect("valid number pattern")
});

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

/// Parse a short model reply: a bare number, else "answer is N", else the
/// first number anywhere.
pub fn parse_reply(reply: &str) -> Option<f64> {
    let reply = reply.trim();
    if BARE.is_match(reply) {
        return parse_number(reply);
    }
    if let Some(caps) = LABELLED.captures(reply) {
        return caps.get(1).and_then(|m| parse_number(m.as_str()));
    }
    FIRST.find(reply).and_then(|m| parse_number(m.as_str()))
}

fn normalize(kind: AnswerKind, value: f64) -> f64 {
    match kind {
        AnswerKind::Power if value > 1.0 => value / 100.0,
        k if k.is_count() => value.round(),
        _ => value,
    }
}

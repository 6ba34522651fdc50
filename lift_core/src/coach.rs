//! Exercise substitution coach collaborator.
//!
//! The actual model backend is an external service reached through the
//! narrow [`CoachTransport`] seam. Whatever goes wrong on the way there
//! (missing credential, transport failure, empty upstream answer), the
//! caller always gets a displayable string back, never an error.

use crate::{Equipment, Exercise, Result};

/// Credential environment variable checked before any upstream call
pub const API_KEY_ENV: &str = "LIFTLOG_API_KEY";

/// Shown when no credential is configured
pub const MISSING_KEY_MESSAGE: &str = "API Key missing. Cannot generate substitute.";

/// Shown when the upstream call fails for any reason
pub const APOLOGY_MESSAGE: &str = "Sorry, I couldn't connect to the AI Coach right now.";

/// Generates a substitute exercise suggestion. Infallible by contract:
/// implementations degrade to a static message instead of erroring.
pub trait SubstituteCoach {
    fn generate_substitute(&self, exercise: &Exercise, available: &[Equipment]) -> String;
}

/// Transport seam to the external model service.
///
/// Downstreams plug in a real network client; this crate ships only
/// [`OfflineTransport`].
pub trait CoachTransport {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Transport for builds without a network client configured. Always fails,
/// which the coach turns into its apology message.
pub struct OfflineTransport;

impl CoachTransport for OfflineTransport {
    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(crate::Error::Coach("no coach transport configured".into()))
    }
}

/// Coach backed by a transport, with credential checking and degradation.
pub struct AiCoach<T: CoachTransport> {
    transport: T,
    api_key: Option<String>,
}

impl<T: CoachTransport> AiCoach<T> {
    pub fn new(transport: T, api_key: Option<String>) -> Self {
        Self { transport, api_key }
    }

    /// Read the credential from the environment.
    pub fn from_env(transport: T) -> Self {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self::new(transport, api_key)
    }
}

impl<T: CoachTransport> SubstituteCoach for AiCoach<T> {
    fn generate_substitute(&self, exercise: &Exercise, available: &[Equipment]) -> String {
        if self.api_key.is_none() {
            tracing::warn!("No {} set; coach unavailable", API_KEY_ENV);
            return MISSING_KEY_MESSAGE.to_string();
        }

        let prompt = build_prompt(exercise, available);

        match self.transport.complete(&prompt) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => "No substitution found.".to_string(),
            Err(e) => {
                tracing::warn!("Coach request failed: {}", e);
                APOLOGY_MESSAGE.to_string()
            }
        }
    }
}

/// Build the coaching prompt from the exercise and available equipment.
fn build_prompt(exercise: &Exercise, available: &[Equipment]) -> String {
    let equipment_list = available
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are an expert biomechanics and fitness coach.\n\
         \n\
         Context:\n\
         The user wants to perform: \"{}\"\n\
         Target Muscle: \"{}\"\n\
         Required Equipment for original: {}\n\
         \n\
         Constraint:\n\
         The user ONLY has the following equipment available: [{}]\n\
         \n\
         Task:\n\
         Recommend ONE biomechanically similar substitute exercise that can \
         be performed with the available equipment.\n\
         Explain briefly why it is a good substitute and how to perform it safely.\n\
         Keep the response concise (under 100 words).",
        exercise.name,
        exercise.target_muscle,
        exercise.required_equipment.join(", "),
        equipment_list
    )
}

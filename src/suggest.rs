use serde::Deserialize;
use tracing::warn;

use crate::llm::CompletionProvider;

/// Follow-up material shown after an answer. Generated by a model as strict
/// JSON; any field the model omits (or a parse/completion failure) falls
/// back to a static default set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    #[serde(default)]
    pub related_questions: Vec<String>,
    #[serde(default)]
    pub power_options: Vec<String>,
    #[serde(default)]
    pub approaches: Vec<String>,
}

/// Explicit parse step; the default-value policy lives in the caller, not
/// in a swallowed exception.
pub fn parse_suggestions(text: &str) -> Result<Suggestions, serde_json::Error> {
    serde_json::from_str(text)
}

fn default_power_options() -> Vec<String> {
    vec![
        "Use --detailed for a comprehensive answer".into(),
        "Try --quick to reuse cached answers".into(),
    ]
}

fn default_approaches() -> Vec<String> {
    vec![
        "Break the question into smaller parts".into(),
        "Specify a particular aspect to focus on".into(),
    ]
}

fn related_questions_for(query: &str) -> Vec<String> {
    vec![
        format!("Tell me more about {query}"),
        format!("What are the latest developments in {query}?"),
        format!("What are the historical aspects of {query}?"),
    ]
}

fn apply_defaults(mut suggestions: Suggestions, query: &str) -> Suggestions {
    if suggestions.related_questions.is_empty() {
        suggestions.related_questions = related_questions_for(query);
    }
    if suggestions.power_options.is_empty() {
        suggestions.power_options = default_power_options();
    }
    if suggestions.approaches.is_empty() {
        suggestions.approaches = default_approaches();
    }
    suggestions
}

pub struct SuggestionsEngine {
    provider: Box<dyn CompletionProvider>,
}

impl SuggestionsEngine {
    pub fn new(provider: Box<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Always returns something usable; failures only cost the generated
    /// variants.
    pub async fn suggestions(&self, query: &str) -> Suggestions {
        let prompt = format!(
            "Given the CLI query \"{query}\", suggest:\n\
             1. Three related questions\n\
             2. Three command-line options or flags that could enhance the answer\n\
             3. Three different approaches to achieve the same goal\n\
             Respond with ONLY a JSON object with keys: relatedQuestions, powerOptions, approaches."
        );

        let generated = match self.provider.generate(&prompt).await {
            Ok(text) => match parse_suggestions(&text) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(error = %err, "failed to parse suggestions response");
                    Suggestions::default()
                }
            },
            Err(err) => {
                warn!(error = %err, "suggestions generation failed");
                Suggestions::default()
            }
        };

        apply_defaults(generated, query)
    }
}

/// Asks a model to rewrite the question for better search results. Any
/// failure keeps the original question.
pub async fn optimize_question(provider: &dyn CompletionProvider, question: &str) -> String {
    let prompt = format!(
        "Rewrite this question so a search-backed assistant gives the best possible answer. \
         Respond with only the rewritten question.\n\n{question}"
    );

    match provider.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => question.to_string(),
        Err(err) => {
            warn!(error = %err, "question optimization failed, keeping the original");
            question.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_defaults, parse_suggestions, Suggestions};

    #[test]
    fn parses_a_complete_json_object() {
        let text = r#"{
            "relatedQuestions": ["q1", "q2", "q3"],
            "powerOptions": ["o1", "o2", "o3"],
            "approaches": ["a1", "a2", "a3"]
        }"#;

        let parsed = parse_suggestions(text).expect("valid JSON should parse");
        assert_eq!(parsed.related_questions, ["q1", "q2", "q3"]);
        assert_eq!(parsed.power_options, ["o1", "o2", "o3"]);
        assert_eq!(parsed.approaches, ["a1", "a2", "a3"]);
    }

    #[test]
    fn missing_fields_parse_as_empty() {
        let parsed =
            parse_suggestions(r#"{"relatedQuestions": ["q1"]}"#).expect("should parse");
        assert_eq!(parsed.related_questions, ["q1"]);
        assert!(parsed.power_options.is_empty());
    }

    #[test]
    fn prose_around_the_json_is_a_parse_error() {
        assert!(parse_suggestions("Sure! Here you go: {}").is_err());
    }

    #[test]
    fn defaults_fill_only_the_empty_fields() {
        let partial = Suggestions {
            related_questions: vec!["kept".into()],
            power_options: Vec::new(),
            approaches: Vec::new(),
        };

        let filled = apply_defaults(partial, "rust");
        assert_eq!(filled.related_questions, ["kept"]);
        assert!(!filled.power_options.is_empty());
        assert!(!filled.approaches.is_empty());
    }

    #[test]
    fn default_related_questions_mention_the_query() {
        let filled = apply_defaults(Suggestions::default(), "rust lifetimes");
        assert!(filled
            .related_questions
            .iter()
            .all(|q| q.contains("rust lifetimes")));
    }
}

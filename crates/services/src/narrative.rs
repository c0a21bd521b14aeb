//! Optional LLM-written feedback layered over the deterministic report.
//!
//! The scored report never waits on this module. Callers that want prose
//! feedback call [`NarrativeFeedback::generate`] after `finish` and fold the
//! result in with [`NarrativeReport::merge_into`].

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use interview_core::model::{FeedbackReport, InterviewType, Resource};
use storage::repository::MessageRecord;

use crate::error::NarrativeError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct NarrativeConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl NarrativeConfig {
    /// Reads `INTERVIEW_AI_API_KEY`, `INTERVIEW_AI_BASE_URL` and `INTERVIEW_AI_MODEL`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`NarrativeConfig::from_env`] with a custom variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("INTERVIEW_AI_API_KEY")?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = lookup("INTERVIEW_AI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let model = lookup("INTERVIEW_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// What the narrative writer gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeContext {
    pub interview_type: InterviewType,
    pub topics: Vec<String>,
    pub transcript: Vec<MessageRecord>,
}

impl NarrativeContext {
    #[must_use]
    pub fn new(
        interview_type: InterviewType,
        topics: Vec<String>,
        transcript: Vec<MessageRecord>,
    ) -> Self {
        Self {
            interview_type,
            topics,
            transcript,
        }
    }

    /// Transcript as `ROLE: content` blocks separated by a blank line.
    #[must_use]
    pub fn transcript_text(&self) -> String {
        self.transcript
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            r#"You are an expert technical interviewer evaluating a candidate's performance in a {ty} interview about {topics}.

Below is the interview conversation:

{conversation}

Provide detailed feedback on the candidate's performance with the following structure:
1. Strengths (list 3-5 bullet points)
2. Areas for Improvement (list 3-5 bullet points)
3. Overall Score (a percentage between 0-100)
4. Suggested Resources (2-3 specific learning resources)

Format your response as JSON:
{{
  "strengths": ["point1", "point2"],
  "improvements": ["point1", "point2"],
  "score": 85,
  "resources": [
    {{"title": "Resource Title", "description": "Brief description"}}
  ]
}}"#,
            ty = self.interview_type.slug(),
            topics = self.topics.join(", "),
            conversation = self.transcript_text(),
        )
    }
}

/// Feedback as returned by the narrative writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeReport {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// Advisory only; never replaces the computed score. Fractional or
    /// percent-suffixed values are rounded, anything unreadable becomes `None`.
    #[serde(deserialize_with = "lenient_score")]
    pub score: Option<u8>,
    pub resources: Vec<Resource>,
}

impl NarrativeReport {
    /// Parse a model reply, tolerating a surrounding Markdown code fence.
    ///
    /// # Errors
    ///
    /// Returns `NarrativeError::EmptyResponse` for a blank reply and
    /// `NarrativeError::Parse` for anything that is not the expected JSON.
    pub fn parse(raw: &str) -> Result<Self, NarrativeError> {
        let body = strip_code_fences(raw);
        if body.is_empty() {
            return Err(NarrativeError::EmptyResponse);
        }
        Ok(serde_json::from_str(body)?)
    }

    /// Returns `base` with any new strengths, improvements, and resources appended.
    ///
    /// Blank and duplicate entries are skipped. The overall score stays as computed.
    #[must_use]
    pub fn merge_into(&self, base: &FeedbackReport) -> FeedbackReport {
        let mut merged = base.clone();
        append_unique(&mut merged.strengths, &self.strengths);
        append_unique(&mut merged.improvements, &self.improvements);
        for resource in &self.resources {
            let title = resource.title.trim();
            if title.is_empty() || merged.resources.iter().any(|r| r.title == title) {
                continue;
            }
            merged
                .resources
                .push(Resource::new(title, resource.description.trim()));
        }
        merged
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let value = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = value
        .filter(|v| v.is_finite() && (0.0..=100.0).contains(v))
        .map(|v| v.round() as u8);
    Ok(score)
}

fn append_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        let item = item.trim();
        if !item.is_empty() && !target.iter().any(|t| t == item) {
            target.push(item.to_string());
        }
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (`json`, etc.) on the opening line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Source of narrative feedback for a finished interview.
#[async_trait]
pub trait NarrativeFeedback: Send + Sync {
    /// # Errors
    ///
    /// Returns `NarrativeError` when feedback cannot be produced.
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeReport, NarrativeError>;
}

/// Chat-completions backed [`NarrativeFeedback`].
#[derive(Clone)]
pub struct LlmNarrativeFeedback {
    client: Client,
    config: Option<NarrativeConfig>,
}

impl LlmNarrativeFeedback {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(NarrativeConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<NarrativeConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl NarrativeFeedback for LlmNarrativeFeedback {
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeReport, NarrativeError> {
        let config = self.config.as_ref().ok_or(NarrativeError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: context.prompt(),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "narrative feedback request rejected");
            return Err(NarrativeError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(NarrativeError::EmptyResponse)?;

        NarrativeReport::parse(&content).inspect_err(|e| {
            tracing::warn!(error = %e, "narrative feedback could not be parsed");
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::{InterviewId, QuestionScore, Role};
    use interview_core::time::fixed_now;

    fn base_report() -> FeedbackReport {
        FeedbackReport {
            strengths: vec!["Showed good understanding of core concepts".into()],
            improvements: vec!["Review fundamental concepts".into()],
            overall_score: 74,
            detailed_analysis: "Based on 1 responses".into(),
            question_scores: vec![QuestionScore {
                question: "q".into(),
                answer: "a".into(),
                score: 74,
                feedback: "f".into(),
            }],
            resources: vec![Resource::new("Technical Communication Skills", "Learn")],
        }
    }

    #[test]
    fn config_requires_non_blank_key() {
        assert!(NarrativeConfig::from_lookup(|_| None).is_none());
        assert!(NarrativeConfig::from_lookup(|_| Some("  ".into())).is_none());

        let config = NarrativeConfig::from_lookup(|key| {
            (key == "INTERVIEW_AI_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn transcript_uses_upper_case_roles() {
        let id = InterviewId::generate();
        let context = NarrativeContext::new(
            InterviewType::Frontend,
            vec!["React".into(), "CSS".into()],
            vec![
                MessageRecord::new(id, Role::Assistant, "What is JSX?", fixed_now()),
                MessageRecord::new(id, Role::User, "Syntax sugar.", fixed_now()),
            ],
        );
        assert_eq!(
            context.transcript_text(),
            "ASSISTANT: What is JSX?\n\nUSER: Syntax sugar."
        );
        let prompt = context.prompt();
        assert!(prompt.contains("frontend interview about React, CSS"));
        assert!(prompt.contains("\"strengths\""));
    }

    #[test]
    fn parse_strips_code_fences() {
        let raw = "```json\n{\"strengths\": [\"Clear\"], \"score\": 80}\n```";
        let report = NarrativeReport::parse(raw).unwrap();
        assert_eq!(report.strengths, ["Clear"]);
        assert_eq!(report.score, Some(80));
        assert!(report.resources.is_empty());

        let plain = NarrativeReport::parse("{\"improvements\": [\"More depth\"]}").unwrap();
        assert_eq!(plain.improvements, ["More depth"]);
    }

    #[test]
    fn odd_scores_do_not_drop_the_reply() {
        let fractional =
            NarrativeReport::parse(r#"{"strengths": ["Clear"], "score": 78.5}"#).unwrap();
        assert_eq!(fractional.score, Some(79));
        assert_eq!(fractional.strengths, ["Clear"]);

        let percent = NarrativeReport::parse(r#"{"score": "85%"}"#).unwrap();
        assert_eq!(percent.score, Some(85));

        let junk = NarrativeReport::parse(
            r#"{"improvements": ["Add examples"], "score": "excellent"}"#,
        )
        .unwrap();
        assert_eq!(junk.score, None);
        assert_eq!(junk.improvements, ["Add examples"]);

        let out_of_range = NarrativeReport::parse(r#"{"score": 140}"#).unwrap();
        assert_eq!(out_of_range.score, None);
    }

    #[test]
    fn parse_rejects_blank_and_prose() {
        assert!(matches!(
            NarrativeReport::parse("  ```\n```  "),
            Err(NarrativeError::EmptyResponse)
        ));
        assert!(matches!(
            NarrativeReport::parse("Great job overall!"),
            Err(NarrativeError::Parse(_))
        ));
    }

    #[test]
    fn merge_appends_new_items_and_keeps_score() {
        let narrative = NarrativeReport {
            strengths: vec![
                "Showed good understanding of core concepts".into(),
                " Clear structure ".into(),
                String::new(),
            ],
            improvements: vec!["Use concrete examples".into()],
            score: Some(20),
            resources: vec![
                Resource::new("Technical Communication Skills", "dup"),
                Resource::new("React Docs", "Official guide"),
            ],
        };

        let merged = narrative.merge_into(&base_report());
        assert_eq!(merged.overall_score, 74);
        assert_eq!(
            merged.strengths,
            ["Showed good understanding of core concepts", "Clear structure"]
        );
        assert_eq!(
            merged.improvements,
            ["Review fundamental concepts", "Use concrete examples"]
        );
        assert_eq!(merged.resources.len(), 2);
        assert_eq!(merged.resources[1].title, "React Docs");
        assert_eq!(merged.question_scores, base_report().question_scores);
    }

    #[tokio::test]
    async fn disabled_service_reports_disabled() {
        let service = LlmNarrativeFeedback::new(None);
        assert!(!service.enabled());
        let context = NarrativeContext::new(InterviewType::Backend, vec!["Go".into()], Vec::new());
        assert!(matches!(
            service.generate(&context).await,
            Err(NarrativeError::Disabled)
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::analyzer;
use crate::model::{
    AnswerAnalysis, DifficultyLevel, FeedbackReport, InterviewType, Question, QuestionScore,
    Resource, ScoreBand, SessionEntry, SessionRecord,
};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Title/description pair rendered into a report resource.
///
/// Both fields accept the placeholders `{topic}`, `{Topic}` (first letter
/// upper-cased), `{topics}` (comma-joined) and `{difficulty}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    pub title: String,
    pub description: String,
}

impl ResourceTemplate {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Text and templates the aggregator renders into prompts and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub resources: Vec<ResourceTemplate>,
    /// Used when no strength rule fires.
    pub default_strengths: Vec<String>,
    /// Used when no improvement rule fires.
    pub default_improvements: Vec<String>,
    /// Appended after the feedback on the final question.
    pub closing_notice: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            resources: vec![
                ResourceTemplate::new(
                    "{Topic} Interview Mastery",
                    "Comprehensive preparation guide covering {topics} with practice questions and detailed explanations",
                ),
                ResourceTemplate::new(
                    "Technical Communication Skills",
                    "Learn how to structure and articulate technical concepts clearly during interviews",
                ),
            ],
            default_strengths: vec![
                "Completed the interview session".into(),
                "Showed willingness to participate".into(),
            ],
            default_improvements: vec![
                "Continue practicing technical interviews".into(),
                "Review fundamental concepts".into(),
            ],
            closing_notice: "That concludes our interview. You can now request feedback to see your detailed performance analysis.".into(),
        }
    }
}

//
// ─── SUBMIT OUTCOME ────────────────────────────────────────────────────────────
//

/// What the interviewer says after an answer is scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub analysis: AnswerAnalysis,
    pub next_prompt: String,
    /// True when a next question was selected.
    pub advanced: bool,
}

//
// ─── AGGREGATOR ────────────────────────────────────────────────────────────────
//

const STRONG_SCORE: u8 = 70;
const WEAK_SCORE: u8 = 50;

/// Scores answers into a `SessionRecord` and folds the record into a report.
///
/// Holds only configuration; all session state lives in the record the caller
/// passes in.
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    config: AggregatorConfig,
}

impl SessionAggregator {
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Opening system message for a session.
    #[must_use]
    pub fn welcome_message(
        &self,
        interview_type: InterviewType,
        topics: &[String],
        difficulty: DifficultyLevel,
    ) -> String {
        format!(
            "Welcome to your {interview_type} mock interview! I'll be asking you technical questions about {} at {difficulty} level. Let's get started!",
            topics.join(", ")
        )
    }

    /// Score `answer` against `current`, append it to `record` and compose the
    /// interviewer's reply.
    ///
    /// `next` is the question that follows `current`, or `None` when `current`
    /// is the last one.
    pub fn submit_answer(
        &self,
        record: &mut SessionRecord,
        answer: &str,
        current: &Question,
        next: Option<&Question>,
    ) -> SubmitOutcome {
        let analysis = analyzer::analyze(answer, current);

        record.push(SessionEntry {
            question: current.text().to_string(),
            answer: answer.to_string(),
            analysis: analysis.clone(),
        });

        let next_prompt = match next {
            Some(next) => transition_prompt(&analysis, next),
            None => format!("{} {}", analysis.feedback, self.config.closing_notice),
        };

        SubmitOutcome {
            analysis,
            next_prompt,
            advanced: next.is_some(),
        }
    }

    /// Fold a (possibly empty or partial) record into the final report.
    ///
    /// Pure: the same record and context always produce the same report.
    #[must_use]
    pub fn build_report(
        &self,
        record: &SessionRecord,
        interview_type: InterviewType,
        topics: &[String],
        difficulty: DifficultyLevel,
    ) -> FeedbackReport {
        let stats = RecordStats::from_record(record);
        let overall = stats.overall_score;

        let (strengths, improvements) = if record.is_empty() {
            (
                self.config.default_strengths.clone(),
                self.config.default_improvements.clone(),
            )
        } else {
            (
                non_empty_or(stats.strengths(), &self.config.default_strengths),
                non_empty_or(stats.improvements(), &self.config.default_improvements),
            )
        };

        let question_scores = record
            .entries()
            .iter()
            .map(|entry| QuestionScore {
                question: entry.question.clone(),
                answer: entry.answer.clone(),
                score: entry.analysis.score,
                feedback: entry.analysis.feedback.clone(),
            })
            .collect();

        let resources = self
            .config
            .resources
            .iter()
            .map(|template| {
                Resource::new(
                    render(&template.title, interview_type, topics, difficulty),
                    render(&template.description, interview_type, topics, difficulty),
                )
            })
            .collect();

        FeedbackReport {
            strengths,
            improvements,
            overall_score: overall,
            detailed_analysis: format!(
                "Based on {} responses with an average score of {overall}%. Your performance varied across different topics, with {} strong answers and {} areas needing improvement.",
                stats.answers, stats.strong, stats.weak
            ),
            question_scores,
            resources,
        }
    }
}

fn transition_prompt(analysis: &AnswerAnalysis, next: &Question) -> String {
    let feedback = &analysis.feedback;
    let next = next.text();
    match analysis.band() {
        ScoreBand::NeedsWork => format!(
            "I notice your answer could be more detailed and specific. {feedback} Let me ask you another question: {next}"
        ),
        ScoreBand::Partial => {
            format!("{feedback} Let's continue with the next question: {next}")
        }
        ScoreBand::Good => format!("{feedback} Moving on to our next topic: {next}"),
        ScoreBand::Excellent | ScoreBand::Outstanding => {
            format!("{feedback} Great! Let's proceed to the next question: {next}")
        }
    }
}

fn non_empty_or(items: Vec<&'static str>, fallback: &[String]) -> Vec<String> {
    if items.is_empty() {
        fallback.to_vec()
    } else {
        items.into_iter().map(str::to_string).collect()
    }
}

fn render(
    template: &str,
    interview_type: InterviewType,
    topics: &[String],
    difficulty: DifficultyLevel,
) -> String {
    let topic = interview_type.slug();
    template
        .replace("{Topic}", &capitalize(topic))
        .replace("{topic}", topic)
        .replace("{topics}", &topics.join(", "))
        .replace("{difficulty}", difficulty.slug())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//
// ─── RECORD STATS ──────────────────────────────────────────────────────────────
//

/// Counts the strength/improvement rules are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RecordStats {
    answers: usize,
    overall_score: u8,
    strong: usize,
    weak: usize,
    mean_answer_chars: f64,
}

impl RecordStats {
    fn from_record(record: &SessionRecord) -> Self {
        let answers = record.len();
        let total: usize = record.scores().map(usize::from).sum();
        let strong = record.scores().filter(|s| *s >= STRONG_SCORE).count();
        let weak = record.scores().filter(|s| *s < WEAK_SCORE).count();
        let chars: usize = record
            .entries()
            .iter()
            .map(|e| e.answer.chars().count())
            .sum();

        // Integer half-up rounding of total / answers; scores are <= 100 so
        // the result always fits in u8.
        let overall_score = if answers == 0 {
            0
        } else {
            u8::try_from((2 * total + answers) / (2 * answers)).unwrap_or(u8::MAX)
        };

        #[allow(clippy::cast_precision_loss)]
        let mean_answer_chars = if answers == 0 {
            0.0
        } else {
            chars as f64 / answers as f64
        };

        Self {
            answers,
            overall_score,
            strong,
            weak,
            mean_answer_chars,
        }
    }

    fn strengths(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.strong * 2 > self.answers {
            out.push("Demonstrated strong technical knowledge in most areas");
        }
        if self.mean_answer_chars > 100.0 {
            out.push("Provided detailed and comprehensive answers");
        }
        if self.answers >= 5 {
            out.push("Engaged actively throughout the interview process");
        }
        if self.overall_score >= 70 {
            out.push("Showed good understanding of core concepts");
        }
        out
    }

    fn improvements(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.weak * 3 > self.answers {
            out.push("Focus on understanding fundamental concepts more deeply");
        }
        if self.mean_answer_chars < 50.0 {
            out.push("Provide more detailed explanations with specific examples");
        }
        if self.overall_score < 60 {
            out.push("Review key technical concepts and practice explaining them clearly");
        }
        if self.answers < 3 {
            out.push("Engage more actively and provide more comprehensive responses");
        }
        out
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str) -> Question {
        Question::new(text, ["alpha", "beta"], ["Gamma delta"], 2).unwrap()
    }

    fn entry(score: u8, answer: &str) -> SessionEntry {
        SessionEntry {
            question: format!("Q{score}"),
            answer: answer.to_string(),
            analysis: AnswerAnalysis {
                score,
                feedback: ScoreBand::from_score(score).feedback().to_string(),
                matched_keywords: Vec::new(),
                matched_concepts: Vec::new(),
            },
        }
    }

    fn long_answer() -> String {
        "a reasonably detailed answer that keeps going ".repeat(3)
    }

    fn topics() -> Vec<String> {
        vec!["React".to_string(), "TypeScript".to_string()]
    }

    fn report_for(record: &SessionRecord) -> FeedbackReport {
        SessionAggregator::default().build_report(
            record,
            InterviewType::Frontend,
            &topics(),
            DifficultyLevel::Intermediate,
        )
    }

    #[test]
    fn empty_record_yields_zero_and_placeholders() {
        let report = report_for(&SessionRecord::new());
        assert_eq!(report.overall_score, 0);
        assert_eq!(
            report.strengths,
            ["Completed the interview session", "Showed willingness to participate"]
        );
        assert_eq!(
            report.improvements,
            ["Continue practicing technical interviews", "Review fundamental concepts"]
        );
        assert!(report.question_scores.is_empty());
        assert_eq!(
            report.detailed_analysis,
            "Based on 0 responses with an average score of 0%. Your performance varied across different topics, with 0 strong answers and 0 areas needing improvement."
        );
    }

    #[test]
    fn overall_score_is_rounded_mean() {
        let record: SessionRecord = [40, 60, 90].into_iter().map(|s| entry(s, "x")).collect();
        assert_eq!(report_for(&record).overall_score, 63);

        let halves: SessionRecord = [50, 51].into_iter().map(|s| entry(s, "x")).collect();
        assert_eq!(report_for(&halves).overall_score, 51);
    }

    #[test]
    fn strong_session_falls_back_to_placeholder_improvements() {
        let answer = long_answer();
        let record: SessionRecord = [80, 75, 90].into_iter().map(|s| entry(s, &answer)).collect();
        let report = report_for(&record);

        assert_eq!(report.overall_score, 82);
        assert!(report
            .strengths
            .contains(&"Demonstrated strong technical knowledge in most areas".to_string()));
        assert!(report
            .strengths
            .contains(&"Showed good understanding of core concepts".to_string()));
        assert!(report
            .strengths
            .contains(&"Provided detailed and comprehensive answers".to_string()));
        assert_eq!(
            report.improvements,
            ["Continue practicing technical interviews", "Review fundamental concepts"]
        );
    }

    #[test]
    fn weak_short_session_collects_all_improvements() {
        let record: SessionRecord = [20, 35].into_iter().map(|s| entry(s, "short")).collect();
        let report = report_for(&record);

        assert_eq!(
            report.improvements,
            [
                "Focus on understanding fundamental concepts more deeply",
                "Provide more detailed explanations with specific examples",
                "Review key technical concepts and practice explaining them clearly",
                "Engage more actively and provide more comprehensive responses",
            ]
        );
        assert_eq!(
            report.strengths,
            ["Completed the interview session", "Showed willingness to participate"]
        );
    }

    #[test]
    fn half_strong_is_not_more_than_half() {
        let record: SessionRecord = [90, 10].into_iter().map(|s| entry(s, "x")).collect();
        let report = report_for(&record);
        assert!(!report
            .strengths
            .iter()
            .any(|s| s.starts_with("Demonstrated strong")));
    }

    #[test]
    fn five_answers_count_as_engaged() {
        let record: SessionRecord = [60; 5].into_iter().map(|s| entry(s, "x")).collect();
        let report = report_for(&record);
        assert_eq!(
            report.strengths,
            ["Engaged actively throughout the interview process"]
        );
    }

    #[test]
    fn question_scores_mirror_record_and_resources_render() {
        let record: SessionRecord = [40, 80].into_iter().map(|s| entry(s, "ans")).collect();
        let report = report_for(&record);

        assert_eq!(report.question_scores.len(), 2);
        assert_eq!(report.question_scores[1].question, "Q80");
        assert_eq!(report.question_scores[1].score, 80);
        assert_eq!(report.question_scores[0].answer, "ans");

        assert_eq!(report.resources.len(), 2);
        assert_eq!(report.resources[0].title, "Frontend Interview Mastery");
        assert_eq!(
            report.resources[0].description,
            "Comprehensive preparation guide covering React, TypeScript with practice questions and detailed explanations"
        );
        assert_eq!(report.resources[1].title, "Technical Communication Skills");
    }

    #[test]
    fn build_report_is_idempotent() {
        let record: SessionRecord = [40, 80].into_iter().map(|s| entry(s, "ans")).collect();
        assert_eq!(report_for(&record), report_for(&record));
    }

    #[test]
    fn custom_resource_templates_are_rendered() {
        let config = AggregatorConfig {
            resources: vec![ResourceTemplate::new(
                "{topic} at {difficulty}",
                "Topics: {topics}",
            )],
            ..AggregatorConfig::default()
        };
        let report = SessionAggregator::new(config).build_report(
            &SessionRecord::new(),
            InterviewType::SystemDesign,
            &["Caching".to_string()],
            DifficultyLevel::Advanced,
        );
        assert_eq!(report.resources, [Resource::new("system-design at advanced", "Topics: Caching")]);
    }

    #[test]
    fn submit_appends_and_composes_transition() {
        let aggregator = SessionAggregator::default();
        let mut record = SessionRecord::new();
        let current = question("First?");
        let next = question("Second?");

        let outcome = aggregator.submit_answer(&mut record, "", &current, Some(&next));

        assert!(outcome.advanced);
        assert_eq!(record.len(), 1);
        assert_eq!(record.entries()[0].question, "First?");
        assert_eq!(outcome.analysis.band(), ScoreBand::NeedsWork);
        assert!(outcome
            .next_prompt
            .starts_with("I notice your answer could be more detailed and specific."));
        assert!(outcome
            .next_prompt
            .ends_with("Let me ask you another question: Second?"));
    }

    #[test]
    fn submit_on_last_question_closes() {
        let aggregator = SessionAggregator::default();
        let mut record = SessionRecord::new();
        let current = question("Only?");

        let outcome = aggregator.submit_answer(&mut record, "alpha beta", &current, None);

        assert!(!outcome.advanced);
        assert_eq!(
            outcome.next_prompt,
            format!(
                "{} That concludes our interview. You can now request feedback to see your detailed performance analysis.",
                outcome.analysis.feedback
            )
        );
    }

    #[test]
    fn transition_lead_in_follows_band() {
        let next = question("Next?");
        let with_score = |score: u8| AnswerAnalysis {
            score,
            feedback: "F.".into(),
            matched_keywords: Vec::new(),
            matched_concepts: Vec::new(),
        };

        assert_eq!(
            transition_prompt(&with_score(40), &next),
            "F. Let's continue with the next question: Next?"
        );
        assert_eq!(
            transition_prompt(&with_score(60), &next),
            "F. Moving on to our next topic: Next?"
        );
        assert_eq!(
            transition_prompt(&with_score(90), &next),
            "F. Great! Let's proceed to the next question: Next?"
        );
    }

    #[test]
    fn welcome_message_names_track_topics_and_level() {
        let msg = SessionAggregator::default().welcome_message(
            InterviewType::Backend,
            &topics(),
            DifficultyLevel::Beginner,
        );
        assert_eq!(
            msg,
            "Welcome to your backend mock interview! I'll be asking you technical questions about React, TypeScript at beginner level. Let's get started!"
        );
    }
}

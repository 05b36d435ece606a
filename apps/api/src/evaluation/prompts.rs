// All LLM prompt constants for the evaluation pipeline.
// System prompts compose a role with the shared JSON-only fragment.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

const CV_EVAL_ROLE: &str = "You are a senior technical hiring manager \
    evaluating a candidate's CV against a job description and a CV scoring rubric.";

const PROJECT_EVAL_ROLE: &str = "You are a senior backend engineer \
    evaluating a candidate's project report against a case study brief and a project scoring rubric.";

const SUMMARY_ROLE: &str = "You are a hiring manager synthesizing two \
    evaluation reports for a candidate into one final recommendation.";

pub fn cv_eval_system() -> String {
    format!("{CV_EVAL_ROLE} {JSON_ONLY_SYSTEM}")
}

pub fn project_eval_system() -> String {
    format!("{PROJECT_EVAL_ROLE} {JSON_ONLY_SYSTEM}")
}

pub fn summary_system() -> String {
    format!("{SUMMARY_ROLE} {JSON_ONLY_SYSTEM}")
}

/// CV evaluation prompt template.
/// Replace: {rubric_context}, {jd_context}, {cv_text}
const CV_EVAL_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's CV against the job description and the CV scoring rubric below.

Compute a weighted average score on a 1-5 scale from the rubric, then CONVERT it to a 0.0 - 1.0 match rate (score / 5.0). Give honest, concise feedback.

--- CV Scoring Rubric ---
{rubric_context}

--- Job Description ---
{jd_context}

--- Candidate CV (extracted text) ---
{cv_text}

Return a JSON object with this EXACT schema (no extra fields):
{
  "cv_match_rate": 0.82,
  "cv_feedback": "Strong in backend and cloud infrastructure; limited hands-on AI integration experience."
}

`cv_match_rate` must be a number between 0.0 and 1.0."#;

/// Project report evaluation prompt template.
/// Replace: {rubric_context}, {brief_context}, {report_text}
const PROJECT_EVAL_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's project report against the case study brief and the project scoring rubric below.

Compute a weighted average score on a 1.0 - 5.0 scale from the rubric. Give honest, concise feedback.

--- Project Scoring Rubric ---
{rubric_context}

--- Case Study Brief ---
{brief_context}

--- Candidate Project Report (extracted text) ---
{report_text}

Return a JSON object with this EXACT schema (no extra fields):
{
  "project_score": 4.5,
  "project_feedback": "Meets all core requirements; error handling around the LLM calls could be more robust."
}

`project_score` must be a number between 1.0 and 5.0."#;

/// Final summary prompt template.
/// Replace: {cv_evaluation}, {project_evaluation}
const SUMMARY_PROMPT_TEMPLATE: &str = r#"You have received two evaluation reports for a candidate. Synthesize them into one final summary of 3-5 sentences that highlights strengths, weaknesses, and a hiring recommendation.

EVALUATION 1: CV
{cv_evaluation}

EVALUATION 2: Project Report
{project_evaluation}

Return a JSON object with this EXACT schema (no extra fields):
{
  "overall_summary": "Good candidate fit overall; strong delivery record, some gaps in ..."
}"#;

pub fn build_cv_prompt(cv_text: &str, jd_context: &str, rubric_context: &str) -> String {
    CV_EVAL_PROMPT_TEMPLATE
        .replace("{rubric_context}", rubric_context)
        .replace("{jd_context}", jd_context)
        .replace("{cv_text}", cv_text)
}

pub fn build_project_prompt(report_text: &str, brief_context: &str, rubric_context: &str) -> String {
    PROJECT_EVAL_PROMPT_TEMPLATE
        .replace("{rubric_context}", rubric_context)
        .replace("{brief_context}", brief_context)
        .replace("{report_text}", report_text)
}

/// Takes the two prior evaluations already serialized as JSON.
pub fn build_summary_prompt(cv_evaluation_json: &str, project_evaluation_json: &str) -> String {
    SUMMARY_PROMPT_TEMPLATE
        .replace("{cv_evaluation}", cv_evaluation_json)
        .replace("{project_evaluation}", project_evaluation_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_prompt_fills_all_placeholders() {
        let prompt = build_cv_prompt("CV BODY", "JD CONTEXT", "RUBRIC CONTEXT");
        assert!(prompt.contains("CV BODY"));
        assert!(prompt.contains("JD CONTEXT"));
        assert!(prompt.contains("RUBRIC CONTEXT"));
        assert!(!prompt.contains("{cv_text}"));
        assert!(!prompt.contains("{jd_context}"));
        assert!(!prompt.contains("{rubric_context}"));
    }

    #[test]
    fn test_project_prompt_fills_all_placeholders() {
        let prompt = build_project_prompt("REPORT BODY", "BRIEF", "RUBRIC");
        assert!(prompt.contains("REPORT BODY"));
        assert!(!prompt.contains("{report_text}"));
        assert!(!prompt.contains("{brief_context}"));
        assert!(!prompt.contains("{rubric_context}"));
    }

    #[test]
    fn test_summary_prompt_embeds_both_evaluations() {
        let prompt = build_summary_prompt(r#"{"cv_match_rate": 0.8}"#, r#"{"project_score": 4.0}"#);
        assert!(prompt.contains(r#"{"cv_match_rate": 0.8}"#));
        assert!(prompt.contains(r#"{"project_score": 4.0}"#));
        assert!(!prompt.contains("{cv_evaluation}"));
        assert!(!prompt.contains("{project_evaluation}"));
    }

    #[test]
    fn test_system_prompts_enforce_json_only() {
        for system in [cv_eval_system(), project_eval_system(), summary_system()] {
            assert!(system.contains("valid JSON only"));
        }
    }
}

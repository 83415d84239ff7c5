// Shared prompt fragments.
// Each feature module keeps its own prompts.rs next to it; this file holds
// the cross-cutting pieces.

/// System prompt fragment that asks for JSON-only output.
/// The model does not always comply; `recovery` handles the rest.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Persona used for every career-coaching prompt.
pub const COACH_SYSTEM: &str = "You are an experienced career coach, technical interviewer \
    and resume reviewer. You give specific, honest and actionable guidance.";

/// Joins the coach persona with the JSON-only rule.
pub fn coach_json_system() -> String {
    format!("{COACH_SYSTEM} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coach_json_system_contains_both_parts() {
        let system = coach_json_system();
        assert!(system.starts_with(COACH_SYSTEM));
        assert!(system.ends_with(JSON_ONLY_SYSTEM));
    }
}

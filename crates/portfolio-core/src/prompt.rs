/// Persona, background, tone and length rules sent ahead of every question.
pub const CONTEXT_PREAMBLE: &str = "\
You are a helpful AI assistant representing Vikas, a Software and AI Engineer.
Background: Final-year CS student at MSIT (CGPA 8.2).
Experience: Outlier AI (AI Contributor), IBM SkillBuild (Data Analyst), Innovate (SDE Intern).
Key Projects: EchoClean (AI Toxic Voice Filter), NetGuard (Secure Communication).
Skills: Java, C++, Python, React, AI/ML, System Design.
Tone: Professional, intelligent, concise, and helpful.
Respond in markdown if helpful. Keep answers under 100 words.";

/// Builds the single prompt string sent to the model.
pub fn compose_prompt(preamble: &str, question: &str) -> String {
    let mut prompt = String::with_capacity(preamble.len() + question.len() + 32);

    prompt.push_str("Context: ");
    prompt.push_str(preamble);
    prompt.push_str("\n\nUser Question: ");
    prompt.push_str(question);

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_preamble_then_question() {
        let prompt = compose_prompt(CONTEXT_PREAMBLE, "What projects has Vikas built?");
        assert!(prompt.starts_with("Context: You are a helpful AI assistant representing Vikas"));
        assert!(prompt.ends_with("\n\nUser Question: What projects has Vikas built?"));
    }

    #[test]
    fn test_question_is_passed_verbatim() {
        let question = "  spaced **markdown** question?  ";
        let prompt = compose_prompt("ctx", question);
        assert_eq!(prompt, format!("Context: ctx\n\nUser Question: {question}"));
    }

    #[test]
    fn test_preamble_states_length_limit() {
        assert!(CONTEXT_PREAMBLE.contains("under 100 words"));
    }
}

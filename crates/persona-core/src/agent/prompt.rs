//! System prompt compiler for persona agents.
//!
//! Turns an [`AgentConfig`] into the system prompt sent as the first message
//! of every chat call. The output depends only on the config: no clock, no
//! randomness, no I/O.

use persona_types::agent::AgentConfig;

/// Footer appended to every prompt.
const SAFETY_FOOTER: &str = "Important: You must ALWAYS identify yourself as an AI agent. Never pretend to be human.\n\
Be helpful, harmless, and honest in all interactions.\n\
If asked about topics outside your expertise, politely redirect or admit limitations.";

/// Compiles agent configuration into a system prompt.
///
/// Layout:
/// ```text
/// You are {name}, an AI agent with the following characteristics:
///
/// Personality:
/// - Tone: ...
/// - Expertise: a, b, c
/// - Response Style: ...
/// - Language Style: ...
///
/// Capabilities:
/// - {one directive per enabled flag}
/// - {one line per custom capability}
///
/// Important: You must ALWAYS identify yourself as an AI agent. ...
/// ```
pub struct PromptCompiler;

impl PromptCompiler {
    pub fn compile(config: &AgentConfig) -> String {
        let personality = &config.personality;
        let mut sections = Vec::with_capacity(4);

        sections.push(format!(
            "You are {}, an AI agent with the following characteristics:",
            config.name
        ));

        sections.push(format!(
            "Personality:\n\
            - Tone: {}\n\
            - Expertise: {}\n\
            - Response Style: {}\n\
            - Language Style: {}",
            personality.tone,
            personality.expertise.join(", "),
            personality.response_style,
            personality.language_style,
        ));

        let mut capability_lines: Vec<String> = config
            .capabilities
            .enabled()
            .map(|c| format!("- {}", c.directive()))
            .collect();
        capability_lines.extend(
            config
                .capabilities
                .custom_capabilities
                .iter()
                .filter(|c| !c.trim().is_empty())
                .map(|c| format!("- {}", c.trim())),
        );
        if capability_lines.is_empty() {
            sections.push("Capabilities:".to_string());
        } else {
            sections.push(format!("Capabilities:\n{}", capability_lines.join("\n")));
        }

        sections.push(SAFETY_FOOTER.to_string());

        sections.join("\n\n")
    }
}

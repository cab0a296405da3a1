//! System prompt for the agent.

use crate::tools::ToolDescriptor;

/// Build the system prompt from the configured instruction and the tools the
/// session can call.
pub fn build_system_prompt(instruction: &str, tools: &[ToolDescriptor]) -> String {
    if tools.is_empty() {
        return instruction.to_string();
    }

    let tool_descriptions = tools
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"{instruction}

## Available tools

{tool_descriptions}

Prefer calling a tool over answering from memory when the question is about a specific cocktail or ingredient."#,
        instruction = instruction,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_tools_after_instruction() {
        let tools = vec![ToolDescriptor {
            name: "search_cocktail_by_name".into(),
            description: "Search cocktails by name".into(),
            parameters: json!({}),
        }];
        let prompt = build_system_prompt("Be helpful.", &tools);
        assert!(prompt.starts_with("Be helpful.\n\n## Available tools"));
        assert!(prompt.contains("- **search_cocktail_by_name**: Search cocktails by name"));
    }

    #[test]
    fn no_tools_means_bare_instruction() {
        assert_eq!(build_system_prompt("Be helpful.", &[]), "Be helpful.");
    }
}

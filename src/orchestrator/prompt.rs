/// Builds the single prompt shared by both completion providers: the raw
/// query plus the formatted search text, with the instruction branch picked
/// by the detailed flag.
pub(crate) fn build_prompt(question: &str, search_results: &str, detailed: bool) -> String {
    let style = if detailed { "detailed" } else { "concise" };
    let requirement = if detailed {
        "- Provide a detailed explanation with examples"
    } else {
        "- Keep it concise"
    };

    format!(
        "Based on the following search results and the user's query \"{question}\", \
         please provide a {style} answer:\n\
         \n\
         Search Results:\n\
         {search_results}\n\
         \n\
         Additional requirements:\n\
         {requirement}\n\
         - Include relevant facts and figures\n\
         - Cite sources when possible\n\
         - Focus on practical, actionable information"
    )
}

#[cfg(test)]
mod tests {
    use super::build_prompt;

    #[test]
    fn concise_branch_asks_for_a_concise_answer() {
        let prompt = build_prompt("What is AI?", "1. RESULT", false);
        assert!(prompt.contains("please provide a concise answer"));
        assert!(prompt.contains("- Keep it concise"));
        assert!(!prompt.contains("detailed explanation"));
    }

    #[test]
    fn detailed_branch_asks_for_examples() {
        let prompt = build_prompt("What is AI?", "1. RESULT", true);
        assert!(prompt.contains("please provide a detailed answer"));
        assert!(prompt.contains("- Provide a detailed explanation with examples"));
    }

    #[test]
    fn prompt_embeds_query_and_search_text() {
        let prompt = build_prompt("What is AI?", "1. ARTIFICIAL INTELLIGENCE", false);
        assert!(prompt.contains("\"What is AI?\""));
        assert!(prompt.contains("Search Results:\n1. ARTIFICIAL INTELLIGENCE"));
    }
}

const FALLBACK_PREFIX: &str = "Based on the search results, here's what I found:";

/// Derives a best-effort answer from the formatted search text when neither
/// completion model produced one. Picks the first line containing the query
/// (case-insensitive) or shaped like the top result, appends one further
/// non-duplicate, non-URL line as context. Never returns an empty string.
pub(crate) fn derive_from_search(search_results: &str, question: &str) -> String {
    let lines: Vec<&str> = search_results
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let Some(&first) = lines.first() else {
        return format!("{FALLBACK_PREFIX}\n\nNo results were returned for this query.");
    };

    let needle = question.to_lowercase();
    let main = lines.iter().copied().find(|line| {
        let lower = line.to_lowercase();
        lower.contains(&needle) || (line.starts_with("1.") && !lower.contains("url:"))
    });

    let Some(main) = main else {
        return format!("{FALLBACK_PREFIX}\n\n{first}");
    };

    let context = lines
        .iter()
        .copied()
        .find(|&line| line != main && !line.to_lowercase().contains("url:"));

    match context {
        Some(context) => format!("{}\n\n{}", main.trim(), context.trim()),
        None => main.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_from_search, FALLBACK_PREFIX};

    const RESULTS: &str = "Search Results:\n\
        \n\
        1. ARTIFICIAL INTELLIGENCE EXPLAINED\n\
        \x20\x20\x20Artificial intelligence is the simulation of human intelligence.\n\
        \x20\x20\x20URL: https://example.com/ai\n\
        \n\
        2. MACHINE LEARNING BASICS\n\
        \x20\x20\x20A subfield of AI focused on data.\n\
        \x20\x20\x20URL: https://example.com/ml";

    #[test]
    fn prefers_the_line_containing_the_query() {
        let answer = derive_from_search(RESULTS, "artificial intelligence explained");
        assert!(answer.starts_with("1. ARTIFICIAL INTELLIGENCE EXPLAINED"));
    }

    #[test]
    fn falls_back_to_the_first_result_shaped_line() {
        let answer = derive_from_search(RESULTS, "quantum gravity");
        assert!(answer.starts_with("1. ARTIFICIAL INTELLIGENCE EXPLAINED"));
    }

    #[test]
    fn appends_one_non_url_context_line() {
        let answer = derive_from_search(RESULTS, "quantum gravity");
        assert!(answer.contains("\n\nSearch Results:"));
        assert!(!answer.to_lowercase().contains("url:"));
    }

    #[test]
    fn wraps_the_first_line_when_nothing_matches() {
        let text = "URL: https://example.com/only\nURL: https://example.com/other";
        let answer = derive_from_search(text, "unrelated");
        assert!(answer.starts_with(FALLBACK_PREFIX));
        assert!(answer.contains("https://example.com/only"));
    }

    #[test]
    fn never_returns_an_empty_answer() {
        assert!(!derive_from_search("", "anything").is_empty());
        assert!(!derive_from_search("\n\n  \n", "anything").is_empty());
    }

    #[test]
    fn query_match_is_case_insensitive() {
        let text = "Knowledge Graph:\nMachine Learning: a subfield of AI";
        let answer = derive_from_search(text, "MACHINE LEARNING");
        assert!(answer.starts_with("Machine Learning: a subfield of AI"));
    }
}

//! Stage description templates bundled at compile time.

/// Web research on a subject
pub const FIND_DATA: &str = include_str!("defaults/find_data.md");

/// Blog article from research
pub const CREATE_CONTENT: &str = include_str!("defaults/create_content.md");

/// Social posts from research
pub const SOCIAL_CREATE_CONTENT: &str = include_str!("defaults/social_create_content.md");

/// Financial news gathering for a sector or country
pub const MONITOR_FINANCIAL_NEWS: &str = include_str!("defaults/monitor_financial_news.md");

/// Financial briefing from gathered news
pub const CREATE_FINANCIAL_CONTENT: &str = include_str!("defaults/create_financial_content.md");

/// Fundamentals research for a ticker
pub const STOCK_RESEARCH: &str = include_str!("defaults/stock_research.md");

/// Analyst report from fundamentals research
pub const STOCK_ANALYSIS: &str = include_str!("defaults/stock_analysis.md");

/// Image prompt and Lexica lookup
pub const IMAGE_SEARCH: &str = include_str!("defaults/image_search.md");

/// All templates with their stage names
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("find_data", FIND_DATA),
        ("create_content", CREATE_CONTENT),
        ("social_create_content", SOCIAL_CREATE_CONTENT),
        ("monitor_financial_news", MONITOR_FINANCIAL_NEWS),
        ("create_financial_content", CREATE_FINANCIAL_CONTENT),
        ("stock_research", STOCK_RESEARCH),
        ("stock_analysis", STOCK_ANALYSIS),
        ("image_search", IMAGE_SEARCH),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Template;

    #[test]
    fn test_all_prompts_non_empty() {
        for (slug, content) in all_defaults() {
            assert!(content.len() > 50, "Prompt '{}' seems too short", slug);
        }
    }

    #[test]
    fn test_prompts_reference_one_input() {
        let expected = [
            ("find_data", "subject"),
            ("create_content", "subject"),
            ("social_create_content", "subject"),
            ("monitor_financial_news", "subject"),
            ("create_financial_content", "subject"),
            ("stock_research", "ticker"),
            ("stock_analysis", "ticker"),
            ("image_search", "context"),
        ];
        for ((slug, content), (name, key)) in all_defaults().into_iter().zip(expected) {
            assert_eq!(slug, name);
            assert_eq!(Template::parse(content).placeholders(), &[key.to_string()]);
        }
    }
}

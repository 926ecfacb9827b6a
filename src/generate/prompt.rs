/// Persona given to the model as the system message
pub const SYSTEM_PROMPT: &str =
    "You are a professional blog writer who creates engaging, well-structured articles.";

/// The two chat messages that ask for an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePrompt {
    pub system: String,
    pub user: String,
}

impl ArticlePrompt {
    pub fn new(title: &str, transcript: &str) -> Self {
        let user = format!(
            "Based on the following YouTube video transcript, write a comprehensive and engaging blog post.\n\n\
             Video Title: {title}\n\n\
             Transcript:\n{transcript}\n\n\
             Please write a well-structured blog article with:\n\
             - An engaging introduction\n\
             - Clear sections with subheadings\n\
             - A compelling conclusion\n\
             - Professional tone (not like a transcript)\n\
             Make it informative and easy to read."
        );

        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_title_transcript_and_structure() {
        let prompt = ArticlePrompt::new("Test Video", "Hello world.");

        assert_eq!(prompt.system, SYSTEM_PROMPT);
        assert!(prompt.user.contains("Video Title: Test Video\n"));
        assert!(prompt.user.contains("Transcript:\nHello world.\n"));
        for requirement in ["introduction", "subheadings", "conclusion", "not like a transcript"] {
            assert!(prompt.user.contains(requirement), "missing {requirement}");
        }
    }

    #[test]
    fn test_prompt_keeps_full_transcript() {
        let transcript = "word ".repeat(5_000);
        let prompt = ArticlePrompt::new("Long", &transcript);
        assert!(prompt.user.contains(&transcript));
    }
}

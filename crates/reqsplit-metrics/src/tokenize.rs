//! Chinese word segmentation

use jieba_rs::Jieba;

/// Splits mixed Chinese/Latin text into words
pub struct Segmenter {
    jieba: Jieba,
}

impl Segmenter {
    /// Load the bundled dictionary
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Words of `text` in order, without whitespace tokens
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.jieba
            .cut(text, true)
            .into_iter()
            .filter(|word| !word.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter").finish_non_exhaustive()
    }
}

/// True when a token has at least one letter or digit
pub(crate) fn is_word(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_cover_text() {
        let segmenter = Segmenter::new();
        let text = "用户登录 查看余额";
        let tokens = segmenter.tokens(text);

        assert!(tokens.len() >= 2);
        assert!(tokens.iter().all(|t| !t.trim().is_empty()));
        assert_eq!(tokens.concat(), text.replace(' ', ""));
    }

    #[test]
    fn test_empty_text() {
        assert!(Segmenter::new().tokens("   ").is_empty());
    }

    #[test]
    fn test_is_word() {
        assert!(is_word("登录"));
        assert!(is_word("v2"));
        assert!(!is_word("，"));
        assert!(!is_word("..."));
    }
}

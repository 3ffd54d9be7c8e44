/// Instructions for one kind of language-model transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptProfile {
    pub name: String,
    pub system: String,
    /// One-shot examples as (user, assistant) pairs
    pub examples: Vec<(String, String)>,
}

impl PromptProfile {
    pub fn translation(language: &str) -> Self {
        let system = match language {
            "zh" => "你是一个专业的译者，将用户输入的句子翻译成中文。要求符合原句的语境".to_string(),
            "en" => "You're a professional translator who translates sentences entered by users \
                     into English. The translation must stay in line with the original context."
                .to_string(),
            other => format!(
                "You're a professional translator who translates sentences entered by users \
                 into the language with ISO 639-1 code \"{other}\". The translation must stay \
                 in line with the original context. Reply with the translation only."
            ),
        };

        Self {
            name: format!("translate-{language}"),
            system,
            examples: Vec::new(),
        }
    }

    pub fn grammar() -> Self {
        Self {
            name: "explain".to_string(),
            system: "You're a language teacher teaching the user Japanese. The user will give \
                     you a grammar point and an example sentence. Explain the grammar in \
                     Japanese and add more examples. Add hiragana readings for kanji words. \
                     Don't use romaji. Use ** to emphasize the grammar point. Output \
                     well-formatted markdown."
                .to_string(),
            examples: vec![(
                grammar_request("そういう", "そういう行動は許せません。"),
                "「そういう～」は日本語の表現で、「そのような〜」という意味を持ちます。\
                 特定の種類、状態、或いは品質を持つ何かを表すために使用されます。\n\n例文：\n\n\
                 **そういう**態度（たいど）は許容（きょよう）できません。 (Such an attitude is not acceptable.)\n\
                 **そういう**意図（いと）は全（まった）くありませんでした。 (There was no such intention at all.)"
                    .to_string(),
            )],
        }
    }

    pub fn reading() -> Self {
        Self {
            name: "reading".to_string(),
            system: "Add the reading of every kanji word in brackets for the Japanese sentence input."
                .to_string(),
            examples: vec![(
                "新学年を迎えるにあたって、私たちは新しい計画を立てました。".to_string(),
                "新学年（しんがくねん）を迎（むか）えるにあたって、私（わたし）たちは新（あたら）しい計画（けいかく）を立（た）てました。"
                    .to_string(),
            )],
        }
    }
}

/// User message asking for an explanation of `term` as used in `sentence`
pub fn grammar_request(term: &str, sentence: &str) -> String {
    format!("Show me the usage of 「{term}」 in the sentence {sentence}")
}

use serde::{Deserialize, Serialize};

/// Which text a voice speaks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "language")]
pub enum TextSource {
    /// The cleaned source-language phrase
    Source,
    /// The translation into the given target language
    Translation(String),
}

/// One synthesis profile. `key` names the stored track, so it is part of the
/// on-disk schema and must stay stable once phrases exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub key: String,
    pub vendor_voice: String,
    pub text_source: TextSource,
    /// SSML prosody rate, e.g. "90%"
    pub rate: Option<String>,
}

impl VoiceProfile {
    pub fn source(key: &str, vendor_voice: &str, rate: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            vendor_voice: vendor_voice.to_string(),
            text_source: TextSource::Source,
            rate: rate.map(str::to_string),
        }
    }

    pub fn translation(language: &str, vendor_voice: &str) -> Self {
        Self {
            key: language.to_string(),
            vendor_voice: vendor_voice.to_string(),
            text_source: TextSource::Translation(language.to_string()),
            rate: None,
        }
    }
}

/// Fixed voice sequence: synthesis work list and concatenation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackOrder {
    voices: Vec<VoiceProfile>,
}

impl PlaybackOrder {
    pub fn new(voices: Vec<VoiceProfile>) -> Result<Self, String> {
        if voices.is_empty() {
            return Err("playback order needs at least one voice".to_string());
        }
        for (index, voice) in voices.iter().enumerate() {
            if !is_valid_key(&voice.key) {
                return Err(format!("invalid voice key: {:?}", voice.key));
            }
            if voices[..index].iter().any(|v| v.key == voice.key) {
                return Err(format!("duplicate voice key: {}", voice.key));
            }
        }
        Ok(Self { voices })
    }

    /// Three Japanese voices reading the phrase, then English and Chinese
    /// voices reading the translations.
    pub fn japanese_study() -> Self {
        Self {
            voices: vec![
                VoiceProfile::source("ja-kazuha", "Kazuha", Some("90%")),
                VoiceProfile::source("ja-tomoko", "Tomoko", Some("90%")),
                VoiceProfile::source("ja-takumi", "Takumi", None),
                VoiceProfile::translation("en", "Amy"),
                VoiceProfile::translation("zh", "Zhiyu"),
            ],
        }
    }

    pub fn voices(&self) -> &[VoiceProfile] {
        &self.voices
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.voices.iter().map(|v| v.key.as_str())
    }

    /// Target languages needed by translation voices, first occurrence first
    pub fn target_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();
        for voice in &self.voices {
            if let TextSource::Translation(language) = &voice.text_source {
                if !languages.contains(language) {
                    languages.push(language.clone());
                }
            }
        }
        languages
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

/// Keys end up in file names: keep them to a conservative alphabet
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Build the SSML payload for one synthesis call
pub fn build_ssml(text: &str, voice: &VoiceProfile) -> String {
    let body = escape_xml(text);
    match &voice.rate {
        Some(rate) => format!(
            "<speak><prosody rate=\"{}\">{}</prosody></speak>",
            escape_xml(rate),
            body
        ),
        None => format!("<speak>{}</speak>", body),
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

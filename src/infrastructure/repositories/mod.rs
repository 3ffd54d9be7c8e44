pub mod openai_translation_repository;
pub mod phrase_index_repository;
pub mod phrase_log_repository;
pub mod polly_speech_repository;
pub mod speech_repository;
pub mod track_repository;
pub mod translation_repository;

pub use openai_translation_repository::OpenAiTranslationRepository;
pub use phrase_index_repository::PhraseIndexRepository;
pub use phrase_log_repository::PhraseLogRepository;
pub use polly_speech_repository::PollySpeechRepository;
pub use speech_repository::SpeechRepository;
pub use track_repository::TrackRepository;
pub use translation_repository::TranslationRepository;

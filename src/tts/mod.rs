pub mod relay;
pub mod speech;
pub mod voice;

pub use relay::{AudioAttachment, Delivery, SpeechRelay, SpeechRequest, TtsError};
pub use speech::{AudioFormat, OpenAiSpeech, SpeechSynthesizer};
pub use voice::{UnsupportedVoice, Voice};

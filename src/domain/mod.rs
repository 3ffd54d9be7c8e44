pub mod audio;
pub mod phrase;
pub mod playback;
pub mod voice;

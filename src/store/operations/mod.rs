pub mod attempts;
pub mod cognitive_states;
pub mod master_words;
pub mod progress;
pub mod submissions;

pub const META: &str = "meta";
pub const COGNITIVE_STATES: &str = "cognitive_states";
pub const PROGRESS: &str = "progress";
pub const ATTEMPTS: &str = "attempts";
pub const MASTER_WORDS: &str = "master_words";

// Secondary index trees
pub const MASTER_WORDS_BY_SCORE: &str = "master_words_by_score";

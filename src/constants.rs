/// 每个用户保留的作答日志条数上限
pub const MAX_ATTEMPTS_PER_USER: usize = 200;

/// 复杂度缓存容量，超出后按插入顺序淘汰一条
pub const COMPLEXITY_CACHE_CAPACITY: usize = 1000;

/// 单词文本长度下限（字符）
pub const MIN_WORD_CHARS: usize = 2;

/// 单词文本长度上限（字符）
pub const MAX_WORD_CHARS: usize = 30;

/// 用户锁表超过此数量时清理空闲条目
pub const USER_LOCK_PRUNE_THRESHOLD: usize = 1000;

/// 一次批量写入主词表的最大单词数
pub const MAX_MASTER_WORD_BATCH: usize = 100;

/// 缺少释义时展示给学习者的占位文本
pub const MISSING_DEFINITION_TEXT: &str = "Definição não disponível.";

/// 选择题的干扰项数量
pub const MCQ_DISTRACTOR_COUNT: usize = 3;

/// 抽取干扰项时从主词表读取的单词数上限
pub const MCQ_DISTRACTOR_SAMPLE_LIMIT: usize = 100;

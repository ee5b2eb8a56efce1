/// 公共验证函数模块
/// 单词文本的规范化与校验，供路由和服务层共用。
use crate::constants::{MAX_WORD_CHARS, MIN_WORD_CHARS};

/// 去除首尾空白并转小写
pub fn normalize_word(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 规范化后必须全部为字母（含带重音字母），长度 2-30 个字符
pub fn validate_word_text(raw: &str) -> Result<String, &'static str> {
    let word = normalize_word(raw);
    let char_count = word.chars().count();
    if char_count < MIN_WORD_CHARS || char_count > MAX_WORD_CHARS {
        return Err("A palavra deve ter entre 2 e 30 caracteres");
    }
    if !word.chars().all(char::is_alphabetic) {
        return Err("A palavra deve conter apenas letras");
    }
    Ok(word)
}

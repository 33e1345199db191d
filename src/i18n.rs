// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）、英文、印尼文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::config::DispatchConfigReader;

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 3] = ["zh-CN", "en", "id"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" / "en" / "id"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use loading_dispatch::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use loading_dispatch::i18n::t_with_args;
/// let msg = t_with_args("error.not_found", &[("entity", "Loading"), ("id", "L1")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 应用配置中的默认语言
///
/// 未知语言保持当前设置，返回最终生效的语言
pub async fn apply_configured_locale<C>(config: &C) -> String
where
    C: DispatchConfigReader + ?Sized,
{
    match config.get_default_locale().await {
        Ok(locale) if SUPPORTED_LOCALES.contains(&locale.trim()) => set_locale(locale.trim()),
        Ok(locale) => tracing::warn!(locale = %locale, "不支持的语言配置，保持当前语言"),
        Err(e) => tracing::warn!(error = %e, "读取语言配置失败，保持当前语言"),
    }
    current_locale()
}

// rust-i18n 的 locale 为全局状态，测试默认并行执行，这里串行化
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

//! Demonstration sentences shown by OS voice settings screens.

use super::iso::to_iso3_language;

/// Sentence used when no localized sample exists.
pub const DEFAULT_SAMPLE_TEXT: &str = "欢迎使用火山引擎语音合成，这是一段示例语音。";

const SAMPLES: &[(&str, &str)] = &[
    ("zho", "欢迎使用火山引擎语音合成，这是一段示例语音。"),
    ("eng", "Welcome to Volcengine text to speech. This is a sample of the selected voice."),
    ("jpn", "火山エンジンの音声合成へようこそ。これはサンプル音声です。"),
    ("kor", "볼케이노 엔진 음성 합성에 오신 것을 환영합니다. 샘플 음성입니다."),
    ("deu", "Willkommen bei der Sprachsynthese von Volcengine. Dies ist eine Beispielstimme."),
    ("fra", "Bienvenue dans la synthèse vocale Volcengine. Ceci est un exemple de voix."),
    ("spa", "Bienvenido a la síntesis de voz de Volcengine. Esta es una voz de ejemplo."),
    ("ita", "Benvenuto nella sintesi vocale di Volcengine. Questa è una voce di esempio."),
    ("por", "Bem-vindo à síntese de voz da Volcengine. Esta é uma voz de exemplo."),
    ("rus", "Добро пожаловать в синтез речи Volcengine. Это пример голоса."),
    ("ara", "مرحبا بكم في تحويل النص إلى كلام من فولكانو. هذا مثال على الصوت."),
    ("tha", "ยินดีต้อนรับสู่ระบบสังเคราะห์เสียงของ Volcengine นี่คือเสียงตัวอย่าง"),
    ("vie", "Chào mừng bạn đến với tổng hợp giọng nói Volcengine. Đây là giọng mẫu."),
    ("ind", "Selamat datang di sintesis suara Volcengine. Ini adalah contoh suara."),
    ("tur", "Volcengine konuşma sentezine hoş geldiniz. Bu bir örnek sestir."),
];

/// Sample sentence for a locale, falling back to [`DEFAULT_SAMPLE_TEXT`].
///
/// Only the language selects the sentence; a missing country still yields
/// the default, as the OS asks with both fields set.
pub fn sample_text(language: Option<&str>, country: Option<&str>) -> &'static str {
    let (Some(language), Some(_country)) = (language, country) else {
        return DEFAULT_SAMPLE_TEXT;
    };
    let language = to_iso3_language(language);
    SAMPLES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, text)| *text)
        .unwrap_or(DEFAULT_SAMPLE_TEXT)
}

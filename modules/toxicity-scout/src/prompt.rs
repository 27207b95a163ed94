use std::borrow::Cow;

use toxicity_common::truncate_chars;

/// Longest text, in characters, ever embedded in a prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 10_000;

/// The 1–10 rubric the model is instructed to follow.
pub const TOXICITY_RUBRIC: &str = "\
1 - Completely non-toxic, respectful, and constructive.
2 - Generally respectful with minor criticism.
3 - Mildly critical but still respectful and civil.
4 - Noticeably critical, some negative tone, but no hostility.
5 - Moderately negative, clear criticism, mild hostility.
6 - Negative tone with moderate hostility and sarcasm.
7 - Clearly hostile, aggressive language, minor insults.
8 - Very hostile, significant insults and inflammatory language.
9 - Extremely hostile, severe insults, potentially threatening language.
10 - Maximum hostility, threats, harassment, or hate speech.";

/// Clip `text` to [`MAX_PROMPT_TEXT_CHARS`] characters, marking the cut with `...`.
pub fn prepare_text(text: &str) -> Cow<'_, str> {
    let clipped = truncate_chars(text, MAX_PROMPT_TEXT_CHARS);
    if clipped.len() == text.len() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{clipped}..."))
    }
}

/// Full classification prompt for one piece of (already trimmed) text.
pub fn build_prompt(text: &str) -> String {
    let text = prepare_text(text);
    format!(
        r#"Analyze the following text and rate its toxicity on a scale from 1 (least toxic) to 10 (most toxic).

Toxicity Scale Definition:
{TOXICITY_RUBRIC}

TEXT:
"{text}"

Respond ONLY in JSON:
{{
    "toxicity_score": number,
    "explanation": "brief reason for score"
}}
"#
    )
}

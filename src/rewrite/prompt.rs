//! Persona-specific prompts for hosted chat providers.
//!
//! Prompts ask for a two-part answer using the same labels the response
//! parser looks for first, which keeps the common case on the labelled rule.

use super::model::{Persona, RewriteRequest};

const ANSWER_FORMAT: &str = concat!(
    "請以以下格式回覆，不要加入其他內容：\n",
    "改寫：<改寫後的句子>\n",
    "解釋：<簡短說明修改的原因>"
);

/// System prompt for `persona`.
#[must_use]
pub fn system_prompt(persona: Persona) -> String {
    let directive = match persona {
        Persona::Harsh => concat!(
            "你是一個嚴格的語言安全模型，會對輸入句子進行審查。",
            "任何攻擊、歧視或不雅的用語都必須移除或改寫，使句子完全符合社群規範。"
        ),
        Persona::Gentle => concat!(
            "你是一個溫和的語言安全模型，會以體貼、尊重的語氣改寫輸入句子，",
            "在符合社群規範的前提下盡量保留說話者的原意與情緒。"
        ),
        Persona::Custom => "你是一個語言安全模型，會對輸入句子進行審查與必要的改寫。",
    };

    format!("{directive}\n{ANSWER_FORMAT}")
}

/// User prompt carrying the sentence to review.
#[must_use]
pub fn user_prompt(request: &RewriteRequest) -> String {
    let mut prompt = String::from("請你對下列句子進行必要的改寫以符合社群規範：\n");
    prompt.push_str(request.text());
    prompt
}

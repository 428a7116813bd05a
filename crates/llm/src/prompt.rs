//! Prompt template for grounded answers

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

const DEFAULT_TEMPLATE: &str = "Bạn là trợ lý bán hàng trong siêu thị. \
Chỉ dựa vào thông tin dưới đây, hãy trả lời ngắn gọn bằng tiếng Việt cho biết sản phẩm nằm ở đâu.\n\
Thông tin: {context}\n\
Câu hỏi: {question}\n\
Trả lời:";

/// Labels a model may echo before its answer
const ANSWER_LABELS: &[&str] = &["Trả lời:", "Answer:"];

/// Fixed prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    stop: Vec<String>,
}

impl PromptTemplate {
    /// Fill in the question and grounding text
    pub fn render(&self, question: &str, grounding: &str) -> String {
        self.template
            .replace(CONTEXT_PLACEHOLDER, grounding)
            .replace(QUESTION_PLACEHOLDER, question.trim())
    }

    /// Stop sequences to send with the completion request
    pub fn stop_sequences(&self) -> &[String] {
        &self.stop
    }

    /// Trim the raw completion, drop an echoed answer label and cut at any
    /// stop sequence the backend did not honor
    pub fn clean_output(&self, raw: &str) -> String {
        let mut text = raw;
        for stop in &self.stop {
            if let Some(idx) = text.find(stop.as_str()) {
                text = &text[..idx];
            }
        }

        let mut text = text.trim();
        for label in ANSWER_LABELS {
            if let Some(rest) = text.strip_prefix(label) {
                text = rest.trim_start();
            }
        }
        text.trim().to_string()
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            stop: vec!["</s>".to_string(), "\nCâu hỏi:".to_string()],
        }
    }
}

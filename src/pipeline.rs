//! Two-stage translate-then-edit pipeline.
//!
//! Stage one translates a Japanese line into Russian with the scene context
//! embedded in the prompt. Stage two asks the model to clean up the grammar
//! of that translation without changing its meaning. The edited text is the
//! final result for the line.

use crate::config::GenerationConfig;
use crate::console::Console;
use crate::llm::LlmClient;
use std::time::Instant;

const TRANSLATION_LABEL: &str = "translation";
const EDIT_LABEL: &str = "edit";

/// Builds the translation prompt. `context` is embedded verbatim.
pub fn translate_prompt(line: &str, context: &str) -> String {
    format!(
        "Ты — литературный переводчик. Переведи на русский язык.
Фразы внутри 「」 — это прямая речь, переводи их как прямую речь.  
Учитывай контекст вокруг текста и описание персонажей для правильной передачи смысла. 
Если в тексте нет японского, тогда **повтори его дословно**.
Вывод строго: одна строка перевода, без комментариев.
{context}
Пример перевода:
Японский: アンナは毎あさ七時に起きます。
Русский: Анна встает в семь утра каждое утро.

Японский: ......
Русский: ......

Переведи:
Японский: {line}
Русский:"
    )
}

/// Builds the editing prompt for an already translated line.
pub fn edit_prompt(line: &str) -> String {
    format!(
        "Ты — литературный редактор. 
Твоя задача — сделать исходный русский текст грамматически правильным, легким для чтения и убрать сложные обороты. 
Сохраняй точный смысл оригинала, не добавляй деталей или эмоций, которых там нет.
Если текст не требует изменений, **повтори его дословно** — **включая все знаки препинания, пробелы и оформление**.

Вывод: одна строка, без комментариев.

Примеры:
Текст: Ваа, свет луны отражается в тихой воде пруда, делая ночь казаться ещё более долгой.
Вывод: Вау, лунный свет, отражаясь в тихой воде пруда, делал ночь бесконечно долгой.

Текст: ......
Вывод: ......

Текст: {line}
Вывод:"
    )
}

/// Result of running one line through both stages.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedLine {
    /// Raw output of the translation stage.
    pub translation: String,
    /// Final edited text.
    pub text: String,
    /// True if either stage fell back to the sentinel.
    pub degraded: bool,
}

/// Runs the translate and edit stages for single lines.
pub struct TranslatePipeline {
    llm: LlmClient,
    max_tokens: u32,
    temperature: f32,
    show_prompts: bool,
    console: Console,
}

impl TranslatePipeline {
    pub fn new(llm: LlmClient, generation: &GenerationConfig) -> Self {
        Self {
            llm,
            max_tokens: generation.max_tokens,
            temperature: generation.temperature,
            show_prompts: false,
            console: Console::new(),
        }
    }

    /// Print every prompt before sending it.
    pub fn with_show_prompts(mut self, show_prompts: bool) -> Self {
        self.show_prompts = show_prompts;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Translate and edit one script line.
    pub async fn run(&self, line: &str, context: &str) -> TranslatedLine {
        let start = Instant::now();
        let line = line.trim();
        self.console.info(&format!("original: {}", line));

        let prompt = translate_prompt(line, context);
        self.print_prompt("TRANSLATE PROMPT", &prompt);
        let translation = self
            .llm
            .generate(&prompt, self.max_tokens, self.temperature, TRANSLATION_LABEL)
            .await;

        let prompt = edit_prompt(&translation.text);
        self.print_prompt("EDIT PROMPT", &prompt);
        let edited = self
            .llm
            .generate(&prompt, self.max_tokens, self.temperature, EDIT_LABEL)
            .await;

        self.console.info(&format!(
            "done in {:.1}s",
            start.elapsed().as_secs_f64()
        ));

        TranslatedLine {
            degraded: translation.exhausted || edited.exhausted,
            translation: translation.text,
            text: edited.text,
        }
    }

    fn print_prompt(&self, label: &str, prompt: &str) {
        if self.show_prompts {
            self.console.prompt_dump(label, prompt);
        }
    }
}

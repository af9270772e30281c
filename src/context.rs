//! Scene context construction.
//!
//! For each script line the builder renders a text blob made of a window of
//! surrounding lines, the names from the dictionary that occur in the line,
//! and a description of who is speaking, looked up by the line before it.

use crate::lookup::{NameDictionary, SpeakerDatabase};
use std::sync::Arc;

/// Default number of lines included on each side of the target line.
pub const DEFAULT_WINDOW_SIZE: usize = 4;

const SCENE_HEADER: &str = "Контекст сцены:";
const NAMES_HEADER: &str = "Словарь имён:";
const SPEAKER_HEADER: &str = "Описание говорящего:";
const DIRECT_SPEECH: &str = "прямая речь";
const NARRATION: &str = "не прямая речь, описание мира вокруг или действий персонажей";

/// Builds the context blob embedded in translation prompts.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    names: Arc<NameDictionary>,
    speakers: Arc<SpeakerDatabase>,
    window_size: usize,
}

impl ContextBuilder {
    pub fn new(names: Arc<NameDictionary>, speakers: Arc<SpeakerDatabase>) -> Self {
        Self {
            names,
            speakers,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    /// Sets the half-window size.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Render the context for `lines[index]`.
    ///
    /// Returns an empty string when there is no scene to show (empty script
    /// or index past the end). Callers treat that as "no context".
    pub fn build(&self, lines: &[String], index: usize) -> String {
        let Some(target) = lines.get(index) else {
            return String::new();
        };

        let scene = self.scene_excerpt(lines, index);
        if scene.is_empty() {
            return String::new();
        }

        let previous = match index {
            0 => "",
            _ => lines[index - 1].trim(),
        };

        format!(
            "\n{SCENE_HEADER}\n{scene}{names}\n{SPEAKER_HEADER} {speaker}\n",
            names = self.names_section(target),
            speaker = self.speaker_description(previous),
        )
    }

    /// Lines `[index - w, index + w]`, clamped to the script, concatenated verbatim.
    pub fn scene_excerpt(&self, lines: &[String], index: usize) -> String {
        let start = index.saturating_sub(self.window_size);
        let end = lines
            .len()
            .min(index.saturating_add(self.window_size).saturating_add(1));

        if start >= end {
            return String::new();
        }

        lines[start..end].concat()
    }

    /// Names section for `line`, or an empty string when no name matches.
    pub fn names_section(&self, line: &str) -> String {
        let relevant = self.names.relevant_to(line);
        if relevant.is_empty() {
            return String::new();
        }

        let entries: Vec<String> = relevant
            .iter()
            .map(|(original, russian)| format!("{original} = {russian}"))
            .collect();

        format!("\n{NAMES_HEADER}\n{}\n", entries.join("\n"))
    }

    /// Describes the speaker introduced by `previous_line`, or narration.
    pub fn speaker_description(&self, previous_line: &str) -> String {
        match self.speakers.lookup(previous_line) {
            Some(person) => format!(
                "{DIRECT_SPEECH}, {}, пол: {}",
                person.description, person.gender
            ),
            None => NARRATION.to_string(),
        }
    }
}

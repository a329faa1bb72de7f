//! Narration units, sequences and the events that produce them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-agnostic identifier of a pre-recorded clip, relative to the
/// `{voice}/{language}` directory (e.g. `moves/knight-f3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipPath(String);

impl ClipPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Phrase a synthesis provider can speak in place of the clip.
    ///
    /// Drops the category directory and turns separators into spaces:
    /// `moves/knight-takes-e4-check` → `knight takes e4 check`.
    pub fn fallback_phrase(&self) -> String {
        let leaf = self.0.rsplit('/').next().unwrap_or_default();
        leaf.split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ClipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a narration unit speaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UnitContent {
    /// A pre-recorded clip.
    Clip { path: ClipPath },
    /// Free text for a synthesis provider.
    Text { text: String },
}

/// One atomic speakable item plus the pause that follows it.
///
/// Immutable once built; fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationUnit {
    content: UnitContent,
    pause_after_ms: u32,
}

impl NarrationUnit {
    pub fn clip(path: ClipPath, pause_after_ms: u32) -> Self {
        Self {
            content: UnitContent::Clip { path },
            pause_after_ms,
        }
    }

    pub fn text(text: impl Into<String>, pause_after_ms: u32) -> Self {
        Self {
            content: UnitContent::Text { text: text.into() },
            pause_after_ms,
        }
    }

    pub const fn content(&self) -> &UnitContent {
        &self.content
    }

    pub const fn pause_after_ms(&self) -> u32 {
        self.pause_after_ms
    }

    /// The words a synthesis provider should say for this unit.
    pub fn spoken_text(&self) -> String {
        match &self.content {
            UnitContent::Text { text } => text.clone(),
            UnitContent::Clip { path } => path.fallback_phrase(),
        }
    }

    /// Short human-readable label for logs.
    pub fn label(&self) -> &str {
        match &self.content {
            UnitContent::Clip { path } => path.as_str(),
            UnitContent::Text { text } => text,
        }
    }
}

/// Monotonically increasing narration request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered units for one narration request, tagged with the generation the
/// sequencer assigned when it accepted the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationSequence {
    pub generation: Generation,
    pub units: Vec<NarrationUnit>,
}

impl NarrationSequence {
    pub const fn new(generation: Generation, units: Vec<NarrationUnit>) -> Self {
        Self { generation, units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// How units should be rendered for the active provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitMode {
    /// Pre-recorded clip paths.
    Clip,
    /// Spoken text for synthesis.
    Text,
}

/// A move (or a bare comment/annotation) the game wants narrated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrationEvent {
    /// Move in standard algebraic notation, if any.
    pub san: Option<String>,
    /// Free-text commentary attached to the move.
    pub comment: String,
    /// Move-quality symbols such as `!!` or `?`.
    pub annotations: Vec<String>,
    /// Half-move count after the move was played (1 = white's first move).
    pub half_moves: u32,
}

impl NarrationEvent {
    pub fn for_move(san: impl Into<String>, half_moves: u32) -> Self {
        Self {
            san: Some(san.into()),
            half_moves,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, symbol: impl Into<String>) -> Self {
        self.annotations.push(symbol.into());
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Full-move number for the event (`ceil(half_moves / 2)`).
    pub const fn move_number(&self) -> u32 {
        self.half_moves.div_ceil(2)
    }
}

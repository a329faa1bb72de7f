//! `translate`: show what a move turns into, without playing anything.

use narrator_core::{annotation_to_spoken, san_to_spoken, translate_annotation, translate_move};

/// One printed row: kind, clip path and spoken text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRow {
    pub kind: &'static str,
    pub clip: Option<String>,
    pub spoken: Option<String>,
}

/// Rows for a move followed by its annotations.
pub fn rows(san: &str, annotations: &[String]) -> Vec<TranslationRow> {
    let clip = translate_move(san);
    let spoken = san_to_spoken(san);
    let mut rows = vec![TranslationRow {
        kind: "move",
        clip: (!clip.is_empty()).then(|| clip.to_string()),
        spoken: (!spoken.is_empty()).then_some(spoken),
    }];

    rows.extend(annotations.iter().map(|symbol| TranslationRow {
        kind: "annotation",
        clip: translate_annotation(symbol).map(|path| path.to_string()),
        spoken: annotation_to_spoken(symbol),
    }));
    rows
}

/// Execute the translate command.
pub fn execute(san: &str, annotations: &[String]) {
    for row in rows(san, annotations) {
        let clip = row.clip.as_deref().unwrap_or("(no clip)");
        let spoken = row
            .spoken
            .map_or_else(|| "(silent)".to_string(), |text| format!("\"{text}\""));
        println!("{:<11} {:<36} {}", row.kind, clip, spoken);
    }
}

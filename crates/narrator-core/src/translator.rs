//! Narration translator: SAN moves and annotation symbols to clip paths or
//! spoken text.
//!
//! Everything here is pure and total. Malformed input degrades to a
//! best-effort path instead of failing the narration.

use crate::domain::{ClipPath, NarrationEvent, NarrationUnit, UnitMode};

/// Pause after the move-number unit.
pub const MOVE_NUMBER_PAUSE_MS: u32 = 150;
/// Pause after the move unit.
pub const MOVE_PAUSE_MS: u32 = 350;
/// Pause after each annotation unit.
pub const ANNOTATION_PAUSE_MS: u32 = 200;
/// Pause after a comment unit.
pub const COMMENT_PAUSE_MS: u32 = 0;

/// Highest move number with a pre-recorded clip.
pub const MAX_NUMBER_CLIP: u32 = 60;

// ── Parsing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl Piece {
    const fn from_letter(c: char) -> Option<Self> {
        match c {
            'K' => Some(Self::King),
            'Q' => Some(Self::Queen),
            'R' => Some(Self::Rook),
            'B' => Some(Self::Bishop),
            'N' => Some(Self::Knight),
            _ => None,
        }
    }

    const fn promotion_from_letter(c: char) -> Option<Self> {
        match c {
            'K' => None,
            other => Self::from_letter(other),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::King => "king",
            Self::Queen => "queen",
            Self::Rook => "rook",
            Self::Bishop => "bishop",
            Self::Knight => "knight",
            Self::Pawn => "pawn",
        }
    }

    const fn spoken(self) -> &'static str {
        match self {
            Self::King => "King",
            Self::Queen => "Queen",
            Self::Rook => "Rook",
            Self::Bishop => "Bishop",
            Self::Knight => "Knight",
            Self::Pawn => "Pawn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Check,
    Checkmate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Kingside,
    Queenside,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParsedMove {
    Castle {
        side: Side,
        suffix: Option<Suffix>,
    },
    Regular {
        piece: Piece,
        disambiguation: String,
        capture: bool,
        destination: String,
        promotion: Option<Piece>,
        suffix: Option<Suffix>,
    },
}

fn split_suffix(san: &str) -> (&str, Option<Suffix>) {
    if let Some(rest) = san.strip_suffix('#') {
        (rest, Some(Suffix::Checkmate))
    } else if let Some(rest) = san.strip_suffix('+') {
        (rest, Some(Suffix::Check))
    } else {
        (san, None)
    }
}

fn castle_side(body: &str) -> Option<Side> {
    match body {
        "O-O" | "0-0" => Some(Side::Kingside),
        "O-O-O" | "0-0-0" => Some(Side::Queenside),
        _ => None,
    }
}

fn parse(san: &str) -> Option<ParsedMove> {
    let san = san.trim();
    if san.is_empty() {
        return None;
    }

    let (body, suffix) = split_suffix(san);
    if let Some(side) = castle_side(body) {
        return Some(ParsedMove::Castle { side, suffix });
    }

    let mut chars: Vec<char> = body.chars().collect();

    let mut promotion = None;
    if let [.., '=', letter] = chars.as_slice() {
        if let Some(piece) = Piece::promotion_from_letter(*letter) {
            promotion = Some(piece);
            chars.truncate(chars.len() - 2);
        }
    }

    let piece = match chars.first().copied().and_then(Piece::from_letter) {
        Some(piece) => {
            chars.remove(0);
            piece
        }
        None => Piece::Pawn,
    };

    let capture = match chars.iter().position(|c| *c == 'x') {
        Some(idx) => {
            chars.remove(idx);
            true
        }
        None => false,
    };

    let split = chars.len().saturating_sub(2);
    let destination: String = chars[split..].iter().collect();
    let disambiguation: String = chars[..split].iter().collect();

    Some(ParsedMove::Regular {
        piece,
        disambiguation,
        capture,
        destination,
        promotion,
        suffix,
    })
}

// ── Clip-path mode ──────────────────────────────────────────────────────────

/// Map a SAN move to its pre-recorded clip path.
///
/// Castling always maps to one of the two `castling/*` clips; a trailing `+`
/// or `#` is dropped because no checked castling clip exists. Spoken mode
/// keeps the suffix. Returns an empty path for empty input.
pub fn translate_move(san: &str) -> ClipPath {
    let Some(parsed) = parse(san) else {
        return ClipPath::new("");
    };

    match parsed {
        ParsedMove::Castle { side, .. } => ClipPath::new(match side {
            Side::Kingside => "castling/kingside",
            Side::Queenside => "castling/queenside",
        }),
        ParsedMove::Regular {
            piece,
            disambiguation,
            capture,
            destination,
            promotion,
            suffix,
        } => {
            let mut parts = vec![piece.name()];
            if !disambiguation.is_empty() {
                parts.push(&disambiguation);
            }
            if capture {
                parts.push("takes");
            }
            if !destination.is_empty() {
                parts.push(&destination);
            }
            if let Some(promoted) = promotion {
                parts.extend(["promotes", "to", promoted.name()]);
            }
            match suffix {
                Some(Suffix::Check) => parts.push("check"),
                Some(Suffix::Checkmate) => parts.push("checkmate"),
                None => {}
            }
            ClipPath::new(format!("moves/{}", parts.join("-")))
        }
    }
}

static ANNOTATIONS: [(&str, &str, &str); 6] = [
    ("!!", "annotations/brilliant", "Brilliant move"),
    ("!", "annotations/good", "Good move"),
    ("!?", "annotations/interesting", "Interesting move"),
    ("?!", "annotations/dubious", "Dubious move"),
    ("?", "annotations/mistake", "Mistake"),
    ("??", "annotations/blunder", "Blunder"),
];

fn lookup_annotation(symbol: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    let symbol = symbol.trim();
    ANNOTATIONS.iter().find(|(sym, _, _)| *sym == symbol)
}

/// Map a move-quality symbol to its clip path; unknown symbols have no audio.
pub fn translate_annotation(symbol: &str) -> Option<ClipPath> {
    lookup_annotation(symbol).map(|(_, path, _)| ClipPath::new(*path))
}

// ── Spoken-text mode ────────────────────────────────────────────────────────

/// Render a SAN move as words for a synthesis provider.
pub fn san_to_spoken(san: &str) -> String {
    let Some(parsed) = parse(san) else {
        return String::new();
    };

    let (mut spoken, suffix) = match parsed {
        ParsedMove::Castle { side, suffix } => (
            match side {
                Side::Kingside => "Castles kingside".to_string(),
                Side::Queenside => "Castles queenside".to_string(),
            },
            suffix,
        ),
        ParsedMove::Regular {
            piece,
            disambiguation,
            capture,
            destination,
            promotion,
            suffix,
        } => {
            let mut words = vec![piece.spoken().to_string()];
            if !disambiguation.is_empty() {
                words.push(disambiguation);
            }
            if capture {
                words.push("takes".to_string());
            }
            if !destination.is_empty() {
                words.push(destination);
            }
            if let Some(promoted) = promotion {
                words.push(format!("promotes to {}", promoted.name()));
            }
            (words.join(" "), suffix)
        }
    };

    match suffix {
        Some(Suffix::Check) => spoken.push_str(", check"),
        Some(Suffix::Checkmate) => spoken.push_str(", checkmate"),
        None => {}
    }
    spoken
}

/// Spoken phrase for a move-quality symbol.
pub fn annotation_to_spoken(symbol: &str) -> Option<String> {
    lookup_annotation(symbol).map(|(_, _, phrase)| (*phrase).to_string())
}

/// Strip PGN command annotations (`[%clk 0:01:00]`, `[%eval 0.3]`) and
/// collapse whitespace.
pub fn clean_comment(comment: &str) -> String {
    let mut out = String::with_capacity(comment.len());
    let mut rest = comment;
    while let Some(start) = rest.find("[%") {
        out.push_str(&rest[..start]);
        rest = match rest[start..].find(']') {
            Some(end) => &rest[start + end + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Units ───────────────────────────────────────────────────────────────────

/// Build the ordered narration units for an event.
///
/// Order: move number, move, annotations, comment. Unknown annotation
/// symbols are skipped. Clip mode drops comments since there is no
/// pre-recorded audio for free text.
pub fn build_units(event: &NarrationEvent, mode: UnitMode) -> Vec<NarrationUnit> {
    let mut units = Vec::new();

    if let Some(san) = event.san.as_deref().filter(|san| !san.trim().is_empty()) {
        let number = event.move_number();
        match mode {
            UnitMode::Clip => {
                if (1..=MAX_NUMBER_CLIP).contains(&number) {
                    units.push(NarrationUnit::clip(
                        ClipPath::new(format!("numbers/{number}")),
                        MOVE_NUMBER_PAUSE_MS,
                    ));
                }
                let path = translate_move(san);
                if !path.is_empty() {
                    units.push(NarrationUnit::clip(path, MOVE_PAUSE_MS));
                }
            }
            UnitMode::Text => {
                if number >= 1 {
                    units.push(NarrationUnit::text(number.to_string(), MOVE_NUMBER_PAUSE_MS));
                }
                let spoken = san_to_spoken(san);
                if !spoken.is_empty() {
                    units.push(NarrationUnit::text(spoken, MOVE_PAUSE_MS));
                }
            }
        }
    }

    for symbol in &event.annotations {
        let unit = match mode {
            UnitMode::Clip => translate_annotation(symbol)
                .map(|path| NarrationUnit::clip(path, ANNOTATION_PAUSE_MS)),
            UnitMode::Text => annotation_to_spoken(symbol)
                .map(|phrase| NarrationUnit::text(phrase, ANNOTATION_PAUSE_MS)),
        };
        units.extend(unit);
    }

    if mode == UnitMode::Text {
        let comment = clean_comment(&event.comment);
        if !comment.is_empty() {
            units.push(NarrationUnit::text(comment, COMMENT_PAUSE_MS));
        }
    }

    units
}

/// The short "1. e4, good move" sample used to test a voice.
pub fn demo_units(mode: UnitMode) -> Vec<NarrationUnit> {
    match mode {
        UnitMode::Clip => vec![
            NarrationUnit::clip(ClipPath::new("numbers/1"), MOVE_NUMBER_PAUSE_MS),
            NarrationUnit::clip(ClipPath::new("moves/pawn-e4"), MOVE_PAUSE_MS),
            NarrationUnit::clip(ClipPath::new("annotations/good"), 0),
        ],
        UnitMode::Text => vec![
            NarrationUnit::text("1", MOVE_NUMBER_PAUSE_MS),
            NarrationUnit::text("Pawn e4", MOVE_PAUSE_MS),
            NarrationUnit::text("Good move", 0),
        ],
    }
}

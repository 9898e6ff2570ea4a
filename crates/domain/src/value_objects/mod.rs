//! Value objects: immutable, validated, compared by value.

mod dice;
mod names;
mod narration;
mod room_code;

pub use dice::{DiceFormula, DiceParseError, DiceRollResult};
pub use names::{DisplayName, SessionName};
pub use narration::{
    ActionKind, HistoryEntry, ImagePrompt, Mechanics, MemoryUpdate, NarrativeLine,
    NarrativeVariants, NarratorOutcome, OutcomeKind, UiAction,
};
pub use room_code::{RoomCode, ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};

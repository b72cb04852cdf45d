//! MIDI data structures and Standard MIDI File output.
//!
//! Notes, chords and tracks model the compiled score; the instrument catalog,
//! channel pool and drum kit cover General MIDI specifics.

mod catalog;
mod channel_pool;
mod drums;
mod midi_export;
mod note;
mod score;
mod track;

pub use catalog::{GeneralMidi, InstrumentCatalog, GM_DRUM_MAP, GM_PROGRAMS};
pub use channel_pool::{ChannelPool, DRUM_CHANNEL, MIDI_CHANNELS};
pub use drums::DrumKit;
pub use midi_export::{export_to_midi, to_bytes, to_smf};
pub use note::{Chord, Note};
pub use score::Score;
pub use track::Track;

/// Standard MIDI note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave whose C is MIDI note 60.
pub const REFERENCE_OCTAVE: i8 = 4;

/// Velocity used when none is given.
pub const DEFAULT_VELOCITY: u8 = 80;

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// ```
/// use midigen::midi::note_to_name;
///
/// assert_eq!(note_to_name(60), "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Semitone offset of a pitch-class name from C: a letter followed by any
/// number of `#`/`b` accidentals. The result is not wrapped, so "Cb" is -1
/// and "B#" is 12.
pub fn pitch_class_offset(name: &str) -> Option<i32> {
    let mut chars = name.chars();
    let letter = chars.next()?;
    let base = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    chars.try_fold(base, |offset, accidental| match accidental {
        '#' | '♯' => Some(offset + 1),
        'b' | '♭' => Some(offset - 1),
        _ => None,
    })
}

/// Converts a note name such as "C4", "F#5", "Bb3" or "C-1" to a MIDI note
/// number. Returns `None` for malformed names or notes outside 0-127.
pub fn name_to_note(name: &str) -> Option<u8> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    // Find where the octave number starts
    let octave_start = name
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(index, _)| index)?;

    let offset = pitch_class_offset(&name[..octave_start])?;
    let octave: i32 = name[octave_start..].parse().ok()?;

    // MIDI note = (octave + 1) * 12 + note_index
    let midi_note = (octave + 1) * 12 + offset;
    u8::try_from(midi_note).ok().filter(|&note| note <= 127)
}

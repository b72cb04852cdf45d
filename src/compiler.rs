//! Song compilation.
//!
//! [`MidiCompiler`] turns a [`Song`] into a [`Score`]. It owns everything
//! protocol-specific: channel allocation, program numbers, octave placement
//! and tick layout. The song is only read.
//!
//! Compilation runs in two stages. The harmonic plan resolves every section's
//! progression in order, carrying the last voicing of one section into the
//! next, so voice leading is continuous across the whole song. Tracks are
//! then assembled from that plan independently, one per instrument, in
//! parallel.

use crate::config::CompilerConfig;
use crate::error::{MidiGenError, Result};
use crate::midi::{
    ChannelPool, Chord, DrumKit, GeneralMidi, InstrumentCatalog, Note, Score, Track, DRUM_CHANNEL,
};
use crate::song::Song;
use crate::theory::{Rhythm, Ticks, TimeConverter, TimedChord};
use rayon::prelude::*;

/// One section's chords, voiced and placed on the song timeline.
#[derive(Debug, Clone)]
struct SectionPlan {
    start: Ticks,
    span: Ticks,
    chords: Vec<TimedChord>,
    rhythm: Option<Rhythm>,
}

#[derive(Debug, Clone)]
enum PartKind {
    /// Plays the song's chords.
    Melodic { program: u8, octave: i8 },
    /// Plays a fixed set of percussion hits on the drum channel.
    Drums(DrumKit),
}

/// A registered instrument and the channel it was given.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    channel: u8,
    kind: PartKind,
}

/// Settings every track is assembled with.
#[derive(Debug, Clone, Copy)]
struct Voicing {
    velocity: u8,
    reference_octave: i8,
}

/// Compiles a borrowed [`Song`] into a [`Score`].
///
/// ```
/// use midigen::{MidiCompiler, Section, Song};
/// use midigen::theory::Key;
///
/// let mut song = Song::new(Key::major("C").unwrap(), 120);
/// song.add_section(Section::new("Verse", 4, "I-V-vi-IV").unwrap());
/// song.add_instrument("Acoustic Grand Piano");
///
/// let mut compiler = MidiCompiler::new(&song).unwrap();
/// let score = compiler.compile().unwrap();
/// assert_eq!(score.track_count(), 1);
/// assert_eq!(score.duration_ticks(), 4 * 1920);
/// ```
pub struct MidiCompiler<'a, C: InstrumentCatalog = GeneralMidi> {
    song: &'a Song,
    catalog: C,
    config: CompilerConfig,
    converter: TimeConverter,
    channels: ChannelPool,
    /// Registered instruments in registration order.
    parts: Vec<Part>,
    score: Score,
}

impl<'a> MidiCompiler<'a, GeneralMidi> {
    /// Creates a compiler using the General MIDI catalog and default settings.
    pub fn new(song: &'a Song) -> Result<Self> {
        Self::with_config(song, CompilerConfig::default())
    }

    /// Creates a compiler using the General MIDI catalog.
    pub fn with_config(song: &'a Song, config: CompilerConfig) -> Result<Self> {
        Self::with_catalog(song, GeneralMidi, config)
    }
}

impl<'a, C: InstrumentCatalog> MidiCompiler<'a, C> {
    /// Creates a compiler resolving instrument names through `catalog`.
    ///
    /// # Errors
    ///
    /// `InvalidResolution` for an unusable `ticks_per_quarter_note`,
    /// `OutOfRange` for a velocity above 127.
    pub fn with_catalog(song: &'a Song, catalog: C, config: CompilerConfig) -> Result<Self> {
        if config.velocity > 127 {
            return Err(MidiGenError::OutOfRange {
                what: "Velocity",
                value: config.velocity as i64,
            });
        }
        let converter = TimeConverter::new(config.ticks_per_quarter_note)?
            .with_time_signature(song.time_signature());
        Ok(Self {
            song,
            catalog,
            config,
            converter,
            channels: ChannelPool::new(),
            parts: Vec::new(),
            score: Score::new(song.tempo(), song.key().clone(), converter),
        })
    }

    pub fn song(&self) -> &Song {
        self.song
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn converter(&self) -> &TimeConverter {
        &self.converter
    }

    /// Channel assigned to a registered instrument or drum part.
    pub fn channel(&self, name: &str) -> Option<u8> {
        self.part(name).map(|part| part.channel)
    }

    /// Melodic channels still free.
    pub fn available_channels(&self) -> usize {
        self.channels.available_count()
    }

    fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }

    fn part_index(&self, name: &str) -> Option<usize> {
        self.parts.iter().position(|part| part.name == name)
    }

    /// Registers an instrument in the reference octave and allocates its
    /// channel. Registering a name again returns the channel it already has.
    ///
    /// # Errors
    ///
    /// `UnknownInstrument` when the catalog has no program for `name`,
    /// `ChannelExhausted` when all 15 melodic channels are in use.
    pub fn add_instrument(&mut self, name: &str) -> Result<u8> {
        if let Some(part) = self.part(name) {
            return Ok(part.channel);
        }
        let program = self
            .catalog
            .program(name)
            .ok_or_else(|| MidiGenError::UnknownInstrument(name.to_string()))?;
        let channel = self.channels.allocate(name)?;
        self.parts.push(Part {
            name: name.to_string(),
            channel,
            kind: PartKind::Melodic {
                program,
                octave: self.config.reference_octave,
            },
        });
        Ok(channel)
    }

    /// Registers an instrument and places its chords in `octave`.
    pub fn add_instrument_in_octave(&mut self, name: &str, octave: i8) -> Result<u8> {
        let channel = self.add_instrument(name)?;
        self.set_octave(name, octave);
        Ok(channel)
    }

    fn set_octave(&mut self, name: &str, octave: i8) {
        if let Some(PartKind::Melodic { octave: current, .. }) = self
            .parts
            .iter_mut()
            .find(|part| part.name == name)
            .map(|part| &mut part.kind)
        {
            *current = octave;
        }
    }

    /// Registers a drum part on the percussion channel. A part already
    /// registered under `name` is replaced.
    pub fn add_drums(&mut self, name: &str, kit: DrumKit) -> u8 {
        self.channels.release(name);
        let part = Part {
            name: name.to_string(),
            channel: DRUM_CHANNEL,
            kind: PartKind::Drums(kit),
        };
        match self.part_index(name) {
            Some(index) => self.parts[index] = part,
            None => self.parts.push(part),
        }
        DRUM_CHANNEL
    }

    /// Resolves every section's progression along one song-wide voice-leading
    /// chain.
    fn harmonic_plan(&self) -> Result<Vec<SectionPlan>> {
        let scale = self.song.key().scale();
        let mut plan = Vec::with_capacity(self.song.sections().len());
        let mut start: Ticks = 0;
        let mut previous: Option<Vec<u8>> = None;

        for section in self.song.sections() {
            let span = self.converter.measures_to_ticks(section.length() as u64);
            let chords = section.chord_progression().schedule(
                &scale,
                &self.converter,
                start,
                span,
                previous.as_deref(),
            )?;

            for chord in &chords {
                tracing::debug!(
                    section = section.name(),
                    symbol = %chord.symbol(),
                    start = chord.start(),
                    duration = chord.duration(),
                    pitches = ?chord.pitches(),
                    "Resolved chord"
                );
            }
            if let Some(last) = chords.last() {
                previous = Some(last.pitches().to_vec());
            }

            plan.push(SectionPlan {
                start,
                span,
                chords,
                rhythm: section.rhythm().cloned(),
            });
            start += span;
        }
        Ok(plan)
    }

    fn voicing(&self) -> Voicing {
        Voicing {
            velocity: self.config.velocity,
            reference_octave: self.config.reference_octave,
        }
    }

    /// Compiles every instrument into a fresh score.
    ///
    /// Instruments named by the song but not yet registered are registered
    /// first. Compiling twice yields the same score.
    ///
    /// # Errors
    ///
    /// Any theory error from the song's progressions aborts the whole
    /// compilation, as do `UnknownInstrument`, `ChannelExhausted` and
    /// `OutOfRange` for chords shifted outside the MIDI range.
    pub fn compile(&mut self) -> Result<&Score> {
        let song = self.song;
        for name in song.instruments() {
            self.add_instrument(name)?;
        }

        let plan = self.harmonic_plan()?;
        let voicing = self.voicing();
        let tracks: Vec<Track> = self
            .parts
            .par_iter()
            .map(|part| assemble_track(part, &plan, voicing))
            .collect::<Result<_>>()?;

        let mut score = Score::new(song.tempo(), song.key().clone(), self.converter);
        for track in tracks {
            score.set_track(track);
        }
        self.score = score;

        tracing::info!(
            tracks = self.score.track_count(),
            sections = plan.len(),
            ticks = self.score.duration_ticks(),
            "Compiled song in {}",
            song.key()
        );
        Ok(&self.score)
    }

    /// Recompiles one instrument with its chords in `octave` and replaces its
    /// track in the score, leaving every other track untouched. On error the
    /// instrument keeps its previous octave.
    ///
    /// # Errors
    ///
    /// `UnknownInstrument` when `name` was never registered with
    /// [`add_instrument`](Self::add_instrument) or [`add_drums`](Self::add_drums),
    /// `OutOfRange` when `octave` pushes a chord outside the MIDI range.
    pub fn compile_instrument(&mut self, name: &str, octave: i8) -> Result<&Track> {
        let index = self
            .part_index(name)
            .ok_or_else(|| MidiGenError::UnknownInstrument(name.to_string()))?;
        let mut part = self.parts[index].clone();
        if let PartKind::Melodic { octave: current, .. } = &mut part.kind {
            *current = octave;
        }

        let plan = self.harmonic_plan()?;
        let track = assemble_track(&part, &plan, self.voicing())?;
        self.parts[index] = part;
        self.score.set_track(track);

        self.score
            .track(name)
            .ok_or_else(|| MidiGenError::UnknownInstrument(name.to_string()))
    }

    /// The score as of the last compilation.
    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn into_score(self) -> Score {
        self.score
    }
}

fn assemble_track(part: &Part, plan: &[SectionPlan], voicing: Voicing) -> Result<Track> {
    let track = match &part.kind {
        PartKind::Melodic { program, octave } => {
            let shift = 12 * (*octave as i64 - voicing.reference_octave as i64);
            let mut track = Track::new(part.name.clone(), part.channel, *program)?;
            for section in plan {
                add_section_chords(&mut track, section, shift, voicing.velocity)?;
            }
            track
        }
        PartKind::Drums(kit) => {
            let mut track = Track::new_drum_track(part.name.clone());
            for &hit in kit.hits() {
                track.add_note(hit);
            }
            track
        }
    };

    tracing::debug!(
        track = track.name(),
        channel = track.channel(),
        notes = track.note_count(),
        "Assembled track"
    );
    Ok(track)
}

/// Sounds each chord once for its full length, or on every rhythm hit that
/// starts inside it, cut off where the chord ends.
fn add_section_chords(
    track: &mut Track,
    section: &SectionPlan,
    shift: i64,
    velocity: u8,
) -> Result<()> {
    let hits = section
        .rhythm
        .as_ref()
        .map(|rhythm| rhythm.hits(section.start, section.span));

    for chord in &section.chords {
        match &hits {
            None => {
                track.add_chord(&strike(chord, shift, velocity, chord.start(), chord.duration())?)
            }
            Some(hits) => {
                for &(time, length) in hits
                    .iter()
                    .filter(|(time, _)| *time >= chord.start() && *time < chord.end())
                {
                    let duration = length.min(chord.end() - time);
                    track.add_chord(&strike(chord, shift, velocity, time, duration)?);
                }
            }
        }
    }
    Ok(())
}

fn strike(
    chord: &TimedChord,
    shift: i64,
    velocity: u8,
    time: Ticks,
    duration: Ticks,
) -> Result<Chord> {
    let notes = chord
        .pitches()
        .iter()
        .map(|&pitch| Note::from_pitch(pitch as i64 + shift, velocity, duration, time))
        .collect::<Result<Vec<_>>>()?;
    Chord::new(notes)
}

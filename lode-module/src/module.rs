//! Module data structures

use crate::{DEFAULT_BASE_RATE, DEFAULT_SPEED, DEFAULT_TEMPO, MAX_CHANNELS, PAN_CENTER};

/// Fully decoded song: instruments, samples, patterns and channel metadata
///
/// All child entities are owned exclusively by the module and are created
/// once during loading; after the load completes nothing is mutated.
#[derive(Debug, Clone)]
pub struct Module {
    /// Song name (free text, already codepage-decoded by the loader)
    pub name: String,
    /// Song message/comment, if the format carries one
    pub comment: Option<String>,
    /// Number of channels used (1-64)
    pub num_channels: usize,
    /// Number of patterns
    pub num_patterns: usize,
    /// Number of tracks (normally `num_patterns * num_channels`)
    pub num_tracks: usize,
    /// Number of instruments
    pub num_instruments: usize,
    /// Number of samples
    pub num_samples: usize,
    /// Number of valid entries in the order list
    pub num_orders: usize,
    /// Order position to restart at when the song loops
    pub restart_position: usize,
    /// Initial speed (ticks per row)
    pub initial_speed: u8,
    /// Initial tempo (BPM)
    pub initial_tempo: u8,
    /// Base sample rate in Hz; newly allocated samples capture this value
    pub base_rate: u32,
    /// Pattern order table
    pub orders: Vec<u8>,
    /// Per-channel default panning (0 = left, 0x80 = center, 0xFF = right)
    pub channel_pan: [u8; MAX_CHANNELS],
    /// Instrument definitions
    pub instruments: Vec<Instrument>,
    /// Sample definitions and payloads
    pub samples: Vec<Sample>,
    /// Extra per-sample metadata, parallel to `samples`
    pub sample_extra: Vec<SampleExtra>,
    /// Pattern slots; `None` until allocated by a loader
    pub patterns: Vec<Option<Pattern>>,
    /// Track slots; `None` until allocated by a loader
    pub tracks: Vec<Option<Track>>,
}

impl Default for Module {
    fn default() -> Self {
        Self {
            name: String::new(),
            comment: None,
            num_channels: 4,
            num_patterns: 0,
            num_tracks: 0,
            num_instruments: 0,
            num_samples: 0,
            num_orders: 0,
            restart_position: 0,
            initial_speed: DEFAULT_SPEED,
            initial_tempo: DEFAULT_TEMPO,
            base_rate: DEFAULT_BASE_RATE,
            orders: Vec::new(),
            channel_pan: [PAN_CENTER; MAX_CHANNELS],
            instruments: Vec::new(),
            samples: Vec::new(),
            sample_extra: Vec::new(),
            patterns: Vec::new(),
            tracks: Vec::new(),
        }
    }
}

impl Module {
    /// Get the pattern at the given order position
    pub fn pattern_at_order(&self, order: usize) -> Option<&Pattern> {
        let pattern_idx = *self.orders.get(order)? as usize;
        self.patterns.get(pattern_idx)?.as_ref()
    }

    /// Get the track for a (pattern, channel) slot
    pub fn track_at(&self, pattern: usize, channel: usize) -> Option<&Track> {
        let pat = self.patterns.get(pattern)?.as_ref()?;
        let track_idx = *pat.track_index.get(channel)?;
        self.tracks.get(track_idx)?.as_ref()
    }

    /// Get the event at (pattern, channel, row)
    pub fn event_at(&self, pattern: usize, channel: usize, row: usize) -> Option<&Event> {
        self.track_at(pattern, channel)?.events.get(row)
    }
}

/// Instrument: a named set of layered/keyed subinstruments
///
/// Most formats use exactly one subinstrument per instrument; multi-sample
/// formats key several variants off one instrument slot.
#[derive(Debug, Clone, Default)]
pub struct Instrument {
    /// Instrument name
    pub name: String,
    /// Layered/keyed variants
    pub sub: Vec<SubInstrument>,
}

/// One playable variant of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubInstrument {
    /// Default volume (0-64)
    pub volume: u8,
    /// Default panning, `None` if the channel default applies
    pub pan: Option<u8>,
    /// Finetune in 1/128 semitone units
    pub finetune: i8,
    /// Transpose in semitones
    pub transpose: i8,
    /// Index into the module's sample array, `None` if silent
    pub sample: Option<usize>,
}

impl Default for SubInstrument {
    fn default() -> Self {
        Self {
            volume: 64,
            pan: None,
            finetune: 0,
            transpose: 0,
            sample: None,
        }
    }
}

/// Sample metadata and payload
#[derive(Debug, Clone, Default)]
pub struct Sample {
    /// Sample name
    pub name: String,
    /// Length in frames (not bytes)
    pub length: u32,
    /// Loop start in frames
    pub loop_start: u32,
    /// Loop end in frames (exclusive)
    pub loop_end: u32,
    /// Default playback rate in Hz, captured from the module's base rate
    /// at allocation time
    pub rate: u32,
    /// Bit-depth and loop-kind flags
    pub flags: SampleFlags,
    /// Decoded payload with guard regions; `None` until loaded
    pub data: Option<SampleBuffer>,
}

impl Sample {
    /// Check if the sample is 16-bit
    pub fn is_16bit(&self) -> bool {
        self.flags.contains(SampleFlags::SIXTEEN_BIT)
    }

    /// Check if the sample loops
    pub fn has_loop(&self) -> bool {
        self.flags.contains(SampleFlags::LOOP)
    }

    /// Check if the loop is bidirectional
    pub fn is_bidir_loop(&self) -> bool {
        self.flags.contains(SampleFlags::LOOP_BIDIR)
    }

    /// Check if this is a synth (FM patch) slot with no PCM payload
    pub fn is_synth(&self) -> bool {
        self.flags.contains(SampleFlags::SYNTH)
    }

    /// Bytes per frame (1 or 2)
    pub fn frame_size(&self) -> usize {
        if self.is_16bit() { 2 } else { 1 }
    }
}

/// Sample bit-depth and loop-kind flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleFlags(u16);

impl SampleFlags {
    /// 16-bit sample (vs 8-bit)
    pub const SIXTEEN_BIT: Self = Self(0x0001);
    /// Forward loop enabled
    pub const LOOP: Self = Self(0x0002);
    /// Bidirectional (ping-pong) loop
    pub const LOOP_BIDIR: Self = Self(0x0004);
    /// Loop covers the full sample
    pub const LOOP_FULL: Self = Self(0x0008);
    /// Synth/FM patch slot, no PCM payload
    pub const SYNTH: Self = Self(0x0010);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Flags with the given bits cleared
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for SampleFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for SampleFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Extra per-sample metadata kept parallel to the sample array
#[derive(Debug, Clone)]
pub struct SampleExtra {
    /// Sustain loop start in frames
    pub sustain_loop_start: u32,
    /// Sustain loop end in frames (exclusive)
    pub sustain_loop_end: u32,
    /// Global volume (0-64)
    pub global_volume: u8,
}

impl Default for SampleExtra {
    fn default() -> Self {
        Self {
            sustain_loop_start: 0,
            sustain_loop_end: 0,
            global_volume: 64,
        }
    }
}

/// Number of guard bytes before the payload
pub(crate) const GUARD_LEAD: usize = 4;

/// Sample payload buffer with guard regions on both ends
///
/// Layout: 4 leading guard bytes, the payload, then 4 (8-bit) or 8 (16-bit)
/// trailing guard bytes. Guard bytes mirror the adjacent real edge frame so
/// out-of-bounds interpolation reads stay defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    bytes: Vec<u8>,
    payload_len: usize,
}

impl SampleBuffer {
    /// Allocate a zeroed buffer for `payload_len` payload bytes
    pub fn alloc(payload_len: usize, sixteen_bit: bool) -> Self {
        let trailing = if sixteen_bit { 8 } else { 4 };
        Self {
            bytes: vec![0u8; GUARD_LEAD + payload_len + trailing],
            payload_len,
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload_len
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload_len == 0
    }

    /// Payload bytes, excluding guard regions
    pub fn payload(&self) -> &[u8] {
        &self.bytes[GUARD_LEAD..GUARD_LEAD + self.payload_len]
    }

    /// Mutable payload bytes, excluding guard regions
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[GUARD_LEAD..GUARD_LEAD + self.payload_len]
    }

    /// Leading guard bytes
    pub fn leading_guard(&self) -> &[u8] {
        &self.bytes[..GUARD_LEAD]
    }

    /// Trailing guard bytes
    pub fn trailing_guard(&self) -> &[u8] {
        &self.bytes[GUARD_LEAD + self.payload_len..]
    }

    /// Whole buffer including guard regions
    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    /// Mirror the edge frames into both guard regions
    ///
    /// Invariant: after this call every guard byte equals the nearest real
    /// edge frame. Empty payloads keep their zeroed guards.
    pub fn mirror_guards(&mut self, sixteen_bit: bool) {
        let frame = if sixteen_bit { 2 } else { 1 };
        if self.payload_len < frame {
            return;
        }

        let first: Vec<u8> = self.bytes[GUARD_LEAD..GUARD_LEAD + frame].to_vec();
        let last_start = GUARD_LEAD + self.payload_len - frame;
        let last: Vec<u8> = self.bytes[last_start..last_start + frame].to_vec();

        for (i, b) in self.bytes[..GUARD_LEAD].iter_mut().enumerate() {
            *b = first[i % frame];
        }
        let tail = GUARD_LEAD + self.payload_len;
        for (i, b) in self.bytes[tail..].iter_mut().enumerate() {
            *b = last[i % frame];
        }
    }
}

/// Pattern: an ordered grid of rows x channels, one track index per channel
///
/// Track indices are flat `pattern * channels + channel` identifiers into
/// the module's track array. Formats that reuse track storage alias the
/// same index from several slots.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    /// Number of rows (1-256)
    pub rows: usize,
    /// One track index per channel
    pub track_index: Vec<usize>,
}

/// Track: the row sequence of events for one (pattern, channel) slot
#[derive(Debug, Clone, Default)]
pub struct Track {
    /// Number of rows (1-256)
    pub rows: usize,
    /// One event per row
    pub events: Vec<Event>,
}

/// One cell in a track: note, instrument, volume and two effect lanes
///
/// Two independent effect lanes are carried because several formats encode
/// two simultaneous effects per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Event {
    /// Note number (0 = none)
    pub note: u8,
    /// Instrument number (0 = none)
    pub instrument: u8,
    /// Volume column value (0 = none)
    pub volume: u8,
    /// First effect type
    pub effect: u8,
    /// First effect parameter
    pub effect_param: u8,
    /// Second effect type
    pub effect2: u8,
    /// Second effect parameter
    pub effect2_param: u8,
}

impl Event {
    /// Check if this event triggers a note
    #[inline]
    pub fn has_note(&self) -> bool {
        self.note > 0
    }

    /// Check if this event sets an instrument
    #[inline]
    pub fn has_instrument(&self) -> bool {
        self.instrument > 0
    }

    /// Check if there is a volume column value
    #[inline]
    pub fn has_volume(&self) -> bool {
        self.volume > 0
    }

    /// Check if either effect lane is active
    #[inline]
    pub fn has_effect(&self) -> bool {
        self.effect != 0
            || self.effect_param != 0
            || self.effect2 != 0
            || self.effect2_param != 0
    }
}

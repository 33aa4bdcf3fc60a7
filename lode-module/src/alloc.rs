//! Allocation layer
//!
//! Builds and validates the structural skeleton that format loaders
//! populate. Every operation rejects out-of-range counts and indices and
//! double allocation instead of panicking; a failure here means the file is
//! structurally corrupt and the caller must abort the whole load.

use crate::module::{Instrument, Pattern, Sample, SampleExtra, SubInstrument, Track};
use crate::{
    Event, Module, ModuleError, MAX_CHANNELS, MAX_INSTRUMENTS, MAX_PATTERN_ROWS, MAX_PATTERNS,
    MAX_SAMPLES,
};

impl Module {
    /// Allocate the instrument array from `num_instruments`
    ///
    /// Instruments start with no subinstruments; loaders call
    /// [`Module::alloc_subinstruments`] per instrument.
    pub fn init_instruments(&mut self) -> Result<(), ModuleError> {
        if self.num_instruments > MAX_INSTRUMENTS {
            return Err(ModuleError::TooManyInstruments(self.num_instruments));
        }
        self.instruments = vec![Instrument::default(); self.num_instruments];
        Ok(())
    }

    /// Allocate the sample and extra-metadata arrays from `num_samples`
    ///
    /// Each new sample captures the module's current base rate as its
    /// default playback rate.
    pub fn init_samples(&mut self) -> Result<(), ModuleError> {
        if self.num_samples > MAX_SAMPLES {
            return Err(ModuleError::TooManySamples(self.num_samples));
        }
        let rate = self.base_rate;
        self.samples = (0..self.num_samples)
            .map(|_| Sample {
                rate,
                ..Sample::default()
            })
            .collect();
        self.sample_extra = vec![SampleExtra::default(); self.num_samples];
        Ok(())
    }

    /// Resize the sample and extra-metadata arrays to `count`
    ///
    /// Resizing to 0 fully releases sample storage. Growing stamps each new
    /// slot's default playback rate from the module's *current* base rate;
    /// existing slots keep the rate they captured when they were allocated.
    pub fn resize_samples(&mut self, count: usize) -> Result<(), ModuleError> {
        if count > MAX_SAMPLES {
            return Err(ModuleError::TooManySamples(count));
        }
        if count == 0 {
            self.samples = Vec::new();
            self.sample_extra = Vec::new();
            self.num_samples = 0;
            return Ok(());
        }
        let rate = self.base_rate;
        self.samples.resize_with(count, || Sample {
            rate,
            ..Sample::default()
        });
        self.sample_extra.resize_with(count, SampleExtra::default);
        self.num_samples = count;
        Ok(())
    }

    /// Allocate `count` subinstruments for the given instrument
    pub fn alloc_subinstruments(
        &mut self,
        instrument: usize,
        count: usize,
    ) -> Result<(), ModuleError> {
        if count == 0 {
            return Err(ModuleError::InvalidSubInstrumentCount(count));
        }
        let ins = self
            .instruments
            .get_mut(instrument)
            .ok_or(ModuleError::InstrumentIndex(instrument))?;
        ins.sub = vec![SubInstrument::default(); count];
        Ok(())
    }

    /// Allocate the pattern and track slot arrays
    ///
    /// `num_tracks` defaults to `num_patterns * num_channels` when the
    /// loader has not set it explicitly.
    pub fn init_patterns(&mut self) -> Result<(), ModuleError> {
        if self.num_channels == 0 || self.num_channels > MAX_CHANNELS {
            return Err(ModuleError::TooManyChannels(self.num_channels));
        }
        if self.num_patterns > MAX_PATTERNS {
            return Err(ModuleError::TooManyPatterns(self.num_patterns));
        }
        if self.num_tracks == 0 {
            self.num_tracks = self.num_patterns * self.num_channels;
        }
        self.patterns = vec![None; self.num_patterns];
        self.tracks = vec![None; self.num_tracks];
        Ok(())
    }

    /// Allocate the pattern at `index`
    ///
    /// The pattern starts with zero rows and one unset track index per
    /// channel; [`Module::alloc_pattern_tracks`] fills both.
    pub fn alloc_pattern(&mut self, index: usize) -> Result<(), ModuleError> {
        if index >= self.num_patterns || index >= self.patterns.len() {
            return Err(ModuleError::PatternIndex(index));
        }
        if self.patterns[index].is_some() {
            return Err(ModuleError::PatternAllocated(index));
        }
        self.patterns[index] = Some(Pattern {
            rows: 0,
            track_index: vec![0; self.num_channels],
        });
        Ok(())
    }

    /// Allocate the track at `index` with `rows` rows
    pub fn alloc_track(&mut self, index: usize, rows: usize) -> Result<(), ModuleError> {
        if index >= self.num_tracks || index >= self.tracks.len() {
            return Err(ModuleError::TrackIndex(index));
        }
        if rows == 0 || rows > MAX_PATTERN_ROWS {
            return Err(ModuleError::InvalidRowCount(rows));
        }
        if self.tracks[index].is_some() {
            return Err(ModuleError::TrackAllocated(index));
        }
        self.tracks[index] = Some(Track {
            rows,
            events: vec![Event::default(); rows],
        });
        Ok(())
    }

    /// Allocate a pattern and one track per channel in a single step
    ///
    /// Track `pattern * num_channels + channel` is allocated for each
    /// channel and wired into the pattern's track index table.
    pub fn alloc_pattern_tracks(&mut self, index: usize, rows: usize) -> Result<(), ModuleError> {
        if rows == 0 || rows > MAX_PATTERN_ROWS {
            return Err(ModuleError::InvalidRowCount(rows));
        }
        self.alloc_pattern(index)?;

        for channel in 0..self.num_channels {
            let track = index * self.num_channels + channel;
            self.alloc_track(track, rows)?;
            if let Some(pattern) = self.patterns[index].as_mut() {
                pattern.track_index[channel] = track;
            }
        }
        if let Some(pattern) = self.patterns[index].as_mut() {
            pattern.rows = rows;
        }
        Ok(())
    }
}

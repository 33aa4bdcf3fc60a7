//! Format loader contract and registry
//!
//! Each tracker format is one [`FormatLoader`] implementation: a cheap
//! `test` probe and a full `load`. Loaders are held in a registry and tried
//! in registration order; the first `test` match wins. There is no
//! inheritance hierarchy — the closed set of formats is a table of boxed
//! trait objects with a name index for direct lookup.

use crate::{LoadError, LoadOptions, SourceReader};
use hashbrown::HashMap;
use lode_module::Module;

/// One tracker format: a signature probe plus a full loader
///
/// `test` must be side-effect free on the implementation itself: probing a
/// file that turns out to be another format must leave the loader reusable.
pub trait FormatLoader {
    /// Short stable identifier, e.g. `"it"`
    fn id(&self) -> &'static str;

    /// Human-readable format name, e.g. `"Impulse Tracker"`
    fn name(&self) -> &'static str;

    /// Probe the source starting at `start`
    ///
    /// Returns the module title on a signature match, `None` when the file
    /// is some other format. Read errors count as "not this format".
    fn test(&self, reader: &mut SourceReader, start: usize) -> Result<Option<String>, LoadError>;

    /// Fully populate `module` from the source starting at `start`
    fn load(
        &self,
        module: &mut Module,
        reader: &mut SourceReader,
        start: usize,
        options: &LoadOptions,
    ) -> Result<(), LoadError>;
}

/// Registry of format loaders, probed in registration order
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn FormatLoader>>,
    index: HashMap<&'static str, usize>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loader; later registrations are probed later
    pub fn register(&mut self, loader: Box<dyn FormatLoader>) {
        self.index.insert(loader.id(), self.loaders.len());
        self.loaders.push(loader);
    }

    /// Look up a loader by its identifier
    pub fn get(&self, id: &str) -> Option<&dyn FormatLoader> {
        self.index.get(id).map(|&i| self.loaders[i].as_ref())
    }

    /// Iterate loaders in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn FormatLoader> {
        self.loaders.iter().map(|l| l.as_ref())
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Find the loader whose signature matches the source
    ///
    /// Rewinds to `start` before every probe. A probe error means "not this
    /// format" and the search continues.
    pub fn probe(
        &self,
        reader: &mut SourceReader,
        start: usize,
    ) -> Option<(&dyn FormatLoader, String)> {
        for loader in self.iter() {
            reader.set_position(start);
            match loader.test(reader, start) {
                Ok(Some(title)) => return Some((loader, title)),
                Ok(None) => {}
                Err(err) => {
                    log::debug!("{} probe failed: {err}", loader.id());
                }
            }
        }
        None
    }

    /// Probe and fully load a module
    ///
    /// The module is built from scratch and returned only on full success;
    /// any loader failure drops everything allocated so far and surfaces
    /// the error. No partial module ever reaches the caller.
    pub fn load_module(
        &self,
        reader: &mut SourceReader,
        start: usize,
        options: &LoadOptions,
    ) -> Result<Module, LoadError> {
        let (loader, _title) = self
            .probe(reader, start)
            .ok_or(LoadError::UnknownFormat)?;

        log::debug!("loading as {}", loader.name());
        reader.set_position(start);
        let mut module = Module::default();
        loader.load(&mut module, reader, start, options)?;
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy format: magic "LODE", one byte channel count, then one byte per
    /// channel of default pan
    struct ToyLoader;

    impl FormatLoader for ToyLoader {
        fn id(&self) -> &'static str {
            "toy"
        }

        fn name(&self) -> &'static str {
            "Toy Format"
        }

        fn test(&self, reader: &mut SourceReader, _start: usize) -> Result<Option<String>, LoadError> {
            let magic = reader.read_slice(4)?;
            if magic == b"LODE" {
                Ok(Some("toy song".to_string()))
            } else {
                Ok(None)
            }
        }

        fn load(
            &self,
            module: &mut Module,
            reader: &mut SourceReader,
            start: usize,
            _options: &LoadOptions,
        ) -> Result<(), LoadError> {
            reader.set_position(start + 4);
            let channels = reader.read_u8()? as usize;
            module.name = "toy song".to_string();
            module.num_channels = channels;
            module.num_patterns = 1;
            module.init_patterns()?;
            module.alloc_pattern_tracks(0, 16)?;
            for channel in 0..channels {
                module.channel_pan[channel] = reader.read_u8()?;
            }
            Ok(())
        }
    }

    /// Loader that matches nothing, to exercise probe ordering
    struct NeverLoader;

    impl FormatLoader for NeverLoader {
        fn id(&self) -> &'static str {
            "never"
        }

        fn name(&self) -> &'static str {
            "Never Matches"
        }

        fn test(&self, _reader: &mut SourceReader, _start: usize) -> Result<Option<String>, LoadError> {
            Ok(None)
        }

        fn load(
            &self,
            _module: &mut Module,
            _reader: &mut SourceReader,
            _start: usize,
            _options: &LoadOptions,
        ) -> Result<(), LoadError> {
            unreachable!("load called on a loader whose test never matches")
        }
    }

    fn registry() -> LoaderRegistry {
        let mut registry = LoaderRegistry::new();
        registry.register(Box::new(NeverLoader));
        registry.register(Box::new(ToyLoader));
        registry
    }

    #[test]
    fn test_probe_finds_matching_loader() {
        let data = b"LODE\x02\x40\xC0".to_vec();
        let mut reader = SourceReader::new(&data);
        let reg = registry();
        let (loader, title) = reg.probe(&mut reader, 0).unwrap();
        assert_eq!(loader.id(), "toy");
        assert_eq!(title, "toy song");
    }

    #[test]
    fn test_probe_unknown_format() {
        let data = b"WHAT\x00".to_vec();
        let mut reader = SourceReader::new(&data);
        assert!(registry().probe(&mut reader, 0).is_none());
    }

    #[test]
    fn test_load_module_success() {
        let data = b"LODE\x02\x40\xC0".to_vec();
        let mut reader = SourceReader::new(&data);
        let module = registry()
            .load_module(&mut reader, 0, &LoadOptions::default())
            .unwrap();

        assert_eq!(module.name, "toy song");
        assert_eq!(module.num_channels, 2);
        assert_eq!(module.channel_pan[0], 0x40);
        assert_eq!(module.channel_pan[1], 0xC0);
        assert!(module.patterns[0].is_some());
    }

    #[test]
    fn test_load_module_failure_returns_no_module() {
        // Valid magic but the channel-pan bytes are missing: the loader
        // fails mid-build and the caller sees only the error
        let data = b"LODE\x02\x40".to_vec();
        let mut reader = SourceReader::new(&data);
        let result = registry().load_module(&mut reader, 0, &LoadOptions::default());
        assert_eq!(result.unwrap_err(), LoadError::UnexpectedEof);
    }

    #[test]
    fn test_load_module_unknown_format() {
        let data = b"????????".to_vec();
        let mut reader = SourceReader::new(&data);
        let result = registry().load_module(&mut reader, 0, &LoadOptions::default());
        assert_eq!(result.unwrap_err(), LoadError::UnknownFormat);
    }

    #[test]
    fn test_get_by_id() {
        let registry = registry();
        assert_eq!(registry.get("toy").unwrap().name(), "Toy Format");
        assert!(registry.get("xm").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_probe_at_offset() {
        let mut data = vec![0xEE; 10];
        data.extend_from_slice(b"LODE\x01\x80");
        let mut reader = SourceReader::new(&data);
        let reg = registry();
        let (loader, _) = reg.probe(&mut reader, 10).unwrap();
        assert_eq!(loader.id(), "toy");
    }
}

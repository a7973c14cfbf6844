// In: src/convert/registry.rs

use std::fmt;

use hashbrown::HashMap;

use super::builtin::{EncoderConverter, ListConverter, PairConverter, SeriesConverter};
use super::{ConversionMode, Converter, Payload};

/// Mode-keyed converter table.
///
/// Built once, then shared read-only; registration is a set-up time
/// operation.
pub struct ConverterRegistry {
    converters: HashMap<ConversionMode, Box<dyn Converter>>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// A registry holding the four built-in converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SeriesConverter));
        registry.register(Box::new(EncoderConverter));
        registry.register(Box::new(ListConverter));
        registry.register(Box::new(PairConverter));
        registry
    }

    /// Adds `converter`, replacing the one registered for its mode only if
    /// its priority level is lower or equal. Returns whether it was installed.
    pub fn register(&mut self, converter: Box<dyn Converter>) -> bool {
        let mode = converter.mode();
        let replace = self
            .converters
            .get(&mode)
            .map_or(true, |existing| converter.priority() <= existing.priority());
        if replace {
            log::debug!("Registered converter for {mode} (priority {})", converter.priority());
            self.converters.insert(mode, converter);
        }
        replace
    }

    pub fn get(&self, mode: ConversionMode) -> Option<&dyn Converter> {
        self.converters.get(&mode).map(|c| c.as_ref())
    }

    pub fn is_supported(&self, mode: ConversionMode) -> bool {
        self.converters.contains_key(&mode)
    }

    /// Registered modes, in their canonical order.
    pub fn known_modes(&self) -> Vec<ConversionMode> {
        ConversionMode::ALL
            .into_iter()
            .filter(|mode| self.is_supported(*mode))
            .collect()
    }

    /// The first converter, in canonical mode order, able to write `payload`.
    pub fn find_for(&self, payload: &Payload) -> Option<&dyn Converter> {
        ConversionMode::ALL
            .into_iter()
            .filter_map(|mode| self.get(mode))
            .find(|converter| converter.is_convertible(payload))
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("modes", &self.known_modes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionContext;
    use crate::error::CodecError;
    use crate::model::Series;
    use crate::reader::BatchReader;
    use std::io::Write;

    struct Tagged {
        priority: i32,
    }

    impl Converter for Tagged {
        fn mode(&self) -> ConversionMode {
            ConversionMode::Series
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn is_convertible(&self, _payload: &Payload) -> bool {
            false
        }
        fn write(
            &self,
            _: &Payload,
            _: &mut dyn Write,
            _: &ConversionContext<'_>,
        ) -> Result<(), CodecError> {
            Ok(())
        }
        fn read(
            &self,
            _: BatchReader<'_>,
            _: &ConversionContext<'_>,
        ) -> Result<Payload, CodecError> {
            Err(CodecError::Internal("not used".into()))
        }
    }

    #[test]
    fn test_priority_rule() {
        let mut registry = ConverterRegistry::with_defaults();
        assert!(!registry.register(Box::new(Tagged { priority: 5 })));
        assert!(registry.register(Box::new(Tagged { priority: 0 })));
        assert_eq!(registry.get(ConversionMode::Series).unwrap().priority(), 0);
        assert!(registry.register(Box::new(Tagged { priority: -1 })));
        assert!(!registry.register(Box::new(Tagged { priority: 0 })));
    }

    #[test]
    fn test_find_for_picks_by_payload_shape() {
        let registry = ConverterRegistry::with_defaults();
        let payload = Payload::Series(Series::new("a"));
        assert_eq!(registry.find_for(&payload).unwrap().mode(), ConversionMode::Series);
        assert_eq!(registry.known_modes(), ConversionMode::ALL.to_vec());
        assert!(ConverterRegistry::new().find_for(&payload).is_none());
    }
}

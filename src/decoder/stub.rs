//! Scripted decoder for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{ALL_FIELDS, DecodeError, Field, MetadataDecoder, RawMetadata};

/// Response for one call shape. `Fields` answers with the subset of the
/// stored map that was asked for, like a real decoder would.
#[derive(Clone)]
pub(crate) enum Script {
    Fields(RawMetadata),
    Fail(DecodeError),
}

/// Answers per path, with separate scripts for the zero-field probe and
/// for field reads. A full-allowlist read can be scripted apart from smaller
/// reads. Unknown paths fail with `NotFound`.
#[derive(Default)]
pub(crate) struct StubDecoder {
    probes: HashMap<String, Script>,
    reads: HashMap<String, Script>,
    full_reads: HashMap<String, Script>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StubDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The file exists and holds `fields`.
    pub(crate) fn with_file(mut self, path: &str, fields: RawMetadata) -> Self {
        self.probes.insert(path.to_string(), Script::Fields(RawMetadata::new()));
        self.reads.insert(path.to_string(), Script::Fields(fields));
        self
    }

    pub(crate) fn with_probe(mut self, path: &str, script: Script) -> Self {
        self.probes.insert(path.to_string(), script);
        self
    }

    pub(crate) fn with_read(mut self, path: &str, script: Script) -> Self {
        self.reads.insert(path.to_string(), script);
        self
    }

    /// Overrides [`with_read`](Self::with_read) for requests of every field.
    pub(crate) fn with_full_read(mut self, path: &str, script: Script) -> Self {
        self.full_reads.insert(path.to_string(), script);
        self
    }

    /// `(path, field count)` for every call, in order.
    pub(crate) fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl MetadataDecoder for StubDecoder {
    fn name(&self) -> &str {
        "stub"
    }

    async fn decode(&self, path: &str, fields: &[Field]) -> Result<RawMetadata, DecodeError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((path.to_string(), fields.len()));
        }
        let script = if fields.is_empty() {
            self.probes.get(path)
        } else if fields.len() == ALL_FIELDS.len() {
            self.full_reads.get(path).or_else(|| self.reads.get(path))
        } else {
            self.reads.get(path)
        };
        match script {
            Some(Script::Fields(all)) => Ok(all
                .iter()
                .filter(|(field, _)| fields.contains(*field))
                .map(|(field, value)| (*field, value.clone()))
                .collect()),
            Some(Script::Fail(err)) => Err(err.clone()),
            None => Err(DecodeError::NotFound(path.to_string())),
        }
    }
}

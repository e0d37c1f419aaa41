//! JSON persistence of fitted demand models

use crate::error::{ForecastError, Result};
use crate::models::DemandModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Version of the on-disk model layout
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    model: &'a DemandModel,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    model: DemandModel,
}

/// Serialize a model to a JSON string
pub fn to_json(model: &DemandModel) -> Result<String> {
    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        model,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Deserialize a model from a JSON string produced by [`to_json`]
pub fn from_json(source: &str) -> Result<DemandModel> {
    let envelope: Envelope = serde_json::from_str(source)?;
    unwrap_envelope(envelope)
}

fn unwrap_envelope(envelope: Envelope) -> Result<DemandModel> {
    if envelope.format_version != FORMAT_VERSION {
        return Err(ForecastError::Persistence(format!(
            "unsupported model format version {} (expected {})",
            envelope.format_version, FORMAT_VERSION
        )));
    }
    envelope.model.validate()?;
    Ok(envelope.model)
}

/// Write a model to `path`, replacing any existing file
pub fn save<P: AsRef<Path>>(model: &DemandModel, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(
        &mut writer,
        &EnvelopeRef {
            format_version: FORMAT_VERSION,
            model,
        },
    )?;
    writer.flush()?;
    info!(path = %path.display(), "demand model saved");
    Ok(())
}

/// Read a model from `path`
pub fn load<P: AsRef<Path>>(path: P) -> Result<DemandModel> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let envelope: Envelope = serde_json::from_reader(reader)?;
    let model = unwrap_envelope(envelope)?;
    info!(
        path = %path.display(),
        history_end = %model.history_end(),
        "demand model loaded"
    );
    Ok(model)
}

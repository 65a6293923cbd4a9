use std::path::Path;

use lofty::prelude::AudioFile;

/// Read the audio properties of `path` and return its duration in seconds.
///
/// Returns `None` when the file is missing or not a format lofty understands.
pub fn probe_duration(path: &Path) -> Option<f64> {
    let tagged = lofty::read_from_path(path).ok()?;
    let secs = tagged.properties().duration().as_secs_f64();
    // lofty reports zero for streams it could not measure.
    if secs > 0.0 { Some(secs) } else { None }
}

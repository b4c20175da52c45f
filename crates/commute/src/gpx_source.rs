//! Replays a recorded GPX track as a location stream.

use std::io::Read;

use gpx::{Gpx, read};
use thiserror::Error;
use time::OffsetDateTime;

use crate::location::{Fix, LocationSink, LocationSource, ReplaySource, SubscriptionHandle};

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("GPX parse error: {0}")]
    Parse(#[from] gpx::errors::GpxError),
    #[error("No timestamped track points found in GPX file")]
    NoTimedPoints,
}

pub struct GpxReplaySource {
    fixes: Vec<Fix>,
    inner: ReplaySource,
}

impl GpxReplaySource {
    pub fn from_reader(reader: impl Read) -> Result<Self, GpxError> {
        let gpx: Gpx = read(reader)?;
        let fixes = Self::extract_fixes(&gpx)?;
        Ok(Self {
            inner: ReplaySource::from_fixes(fixes.iter().copied()),
            fixes,
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, GpxError> {
        Self::from_reader(std::io::Cursor::new(data))
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    /// Points without a timestamp cannot be placed in the stream and are skipped.
    fn extract_fixes(gpx: &Gpx) -> Result<Vec<Fix>, GpxError> {
        let mut fixes = Vec::new();
        let mut skipped = 0usize;

        for track in &gpx.tracks {
            for segment in &track.segments {
                for waypoint in &segment.points {
                    let Some(time) = waypoint.time else {
                        skipped += 1;
                        continue;
                    };
                    let point = waypoint.point();
                    fixes.push(Fix::new(point.y(), point.x(), OffsetDateTime::from(time)));
                }
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {skipped} GPX points without timestamps");
        }
        if fixes.is_empty() {
            return Err(GpxError::NoTimedPoints);
        }

        Ok(fixes)
    }
}

impl LocationSource for GpxReplaySource {
    fn start(&mut self, sink: LocationSink) -> SubscriptionHandle {
        self.inner.start(sink)
    }

    fn stop(&mut self, handle: SubscriptionHandle) {
        self.inner.stop(handle);
    }
}

use beacon_core::SignalingError;
use std::collections::HashMap;

/// Name used when the caller doesn't pick one.
pub const DEFAULT_STREAM: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub kind: TrackKind,
    pub enabled: bool,
}

/// What a local capture should contain. Defaults to audio plus video,
/// mirroring a plain camera acquisition.
#[derive(Debug, Clone)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<u32>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            width: None,
            height: None,
            frame_rate: None,
        }
    }
}

#[derive(Debug, Clone)]
struct LocalStream {
    tracks: Vec<Track>,
    /// Externally created streams are not ours to tear down.
    external: bool,
}

/// Registry of named local streams. A stream stays owned by the manager
/// until explicitly closed.
#[derive(Default)]
pub struct MediaManager {
    streams: HashMap<String, LocalStream>,
    next_track: u64,
}

impl MediaManager {
    /// Acquire a named local source described by the constraints.
    pub fn init_local_stream(
        &mut self,
        name: &str,
        constraints: &MediaConstraints,
    ) -> Result<(), SignalingError> {
        if self.streams.contains_key(name) {
            return Err(SignalingError::Media(format!(
                "stream '{name}' already exists; close it before reacquiring"
            )));
        }
        if !constraints.audio && !constraints.video {
            return Err(SignalingError::Media(
                "constraints request neither audio nor video".to_owned(),
            ));
        }

        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(self.new_track(TrackKind::Audio));
        }
        if constraints.video {
            tracks.push(self.new_track(TrackKind::Video));
        }
        self.streams.insert(
            name.to_owned(),
            LocalStream {
                tracks,
                external: false,
            },
        );
        Ok(())
    }

    /// Compose a new named stream from existing tracks.
    pub fn build_local_stream(
        &mut self,
        name: &str,
        audio_tracks: Vec<Track>,
        video_tracks: Vec<Track>,
    ) -> Result<(), SignalingError> {
        if self.streams.contains_key(name) {
            return Err(SignalingError::Media(format!(
                "stream '{name}' already exists"
            )));
        }
        let mut tracks = audio_tracks;
        tracks.extend(video_tracks);
        self.streams.insert(
            name.to_owned(),
            LocalStream {
                tracks,
                external: false,
            },
        );
        Ok(())
    }

    /// Adopt a stream created by another library. The supplying party keeps
    /// tracking its real lifetime.
    pub fn register_external_stream(&mut self, name: &str) -> Result<(), SignalingError> {
        if self.streams.contains_key(name) {
            return Err(SignalingError::Media(format!(
                "stream '{name}' already exists"
            )));
        }
        self.streams.insert(
            name.to_owned(),
            LocalStream {
                tracks: Vec::new(),
                external: true,
            },
        );
        Ok(())
    }

    pub fn close_local_stream(&mut self, name: &str) -> Result<(), SignalingError> {
        self.streams
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SignalingError::Media(format!("no local stream named '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    pub fn local_stream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn tracks_of(&self, name: &str) -> Vec<Track> {
        self.streams
            .get(name)
            .map(|s| s.tracks.clone())
            .unwrap_or_default()
    }

    pub fn is_external(&self, name: &str) -> bool {
        self.streams.get(name).is_some_and(|s| s.external)
    }

    /// Enable or disable every track of a kind in one stream (camera or
    /// microphone toggling). Returns whether the stream exists.
    pub fn enable_tracks(&mut self, name: &str, kind: TrackKind, enabled: bool) -> bool {
        match self.streams.get_mut(name) {
            Some(stream) => {
                for track in stream.tracks.iter_mut().filter(|t| t.kind == kind) {
                    track.enabled = enabled;
                }
                true
            }
            None => false,
        }
    }

    /// Whether a named stream (or any stream, when `name` is None) carries a
    /// track of the kind.
    pub fn have_track(&self, name: Option<&str>, kind: TrackKind) -> bool {
        match name {
            Some(name) => self
                .streams
                .get(name)
                .is_some_and(|s| s.tracks.iter().any(|t| t.kind == kind)),
            None => self
                .streams
                .values()
                .any(|s| s.tracks.iter().any(|t| t.kind == kind)),
        }
    }

    fn new_track(&mut self, kind: TrackKind) -> Track {
        self.next_track += 1;
        let prefix = match kind {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        };
        Track {
            id: format!("{prefix}-{}", self.next_track),
            kind,
            enabled: true,
        }
    }
}

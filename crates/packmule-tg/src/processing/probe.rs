use crate::util::process;
use crate::Result;
use serde::Deserialize;
use std::path::Path;

/// Subset of the probe tool's JSON report that the command builders need.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MediaProbe {
    #[serde(default)]
    pub(crate) streams: Vec<StreamInfo>,
    pub(crate) format: Option<FormatInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamInfo {
    pub(crate) codec_type: Option<String>,
    pub(crate) codec_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FormatInfo {
    pub(crate) duration: Option<String>,
}

/// The four track kinds the per-track settings can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Attachment,
}

impl TrackKind {
    /// The stream specifier letter in the media tool's `-map` syntax.
    pub(crate) fn specifier(self) -> &'static str {
        match self {
            Self::Video => "v",
            Self::Audio => "a",
            Self::Subtitle => "s",
            Self::Attachment => "t",
        }
    }

    fn codec_type(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Attachment => "attachment",
        }
    }
}

impl MediaProbe {
    pub(crate) async fn read(probe_tool: &str, path: &Path) -> Result<MediaProbe> {
        let path = path.to_string_lossy();
        process::run_json(
            probe_tool,
            &[
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &path,
            ],
        )
        .await
    }

    pub(crate) fn duration(&self) -> Option<f64> {
        self.format
            .as_ref()?
            .duration
            .as_deref()?
            .trim()
            .parse()
            .ok()
    }

    pub(crate) fn count(&self, kind: TrackKind) -> usize {
        self.streams
            .iter()
            .filter(|stream| stream.codec_type.as_deref() == Some(kind.codec_type()))
            .count()
    }

    pub(crate) fn has(&self, kind: TrackKind) -> bool {
        self.count(kind) > 0
    }

    /// The codec names of the first video and audio streams. Two files are
    /// compatible for the concat demuxer when these match.
    pub(crate) fn lead_codecs(&self) -> (Option<&str>, Option<&str>) {
        let lead = |kind: TrackKind| {
            self.streams
                .iter()
                .find(|stream| stream.codec_type.as_deref() == Some(kind.codec_type()))
                .and_then(|stream| stream.codec_name.as_deref())
        };

        (lead(TrackKind::Video), lead(TrackKind::Audio))
    }
}

use std::path::Path;

use crate::command::ToolCommand;
use crate::config::MediaConfig;

/// ffmpeg/ffprobe flag helpers
pub trait FfmpegArgs: Sized {
    fn input<P: AsRef<Path>>(self, path: P) -> Self;
    fn output_file<P: AsRef<Path>>(self, path: P) -> Self;
    fn overwrite(self) -> Self;
    fn no_video(self) -> Self;
    fn audio_codec<S: Into<String>>(self, codec: S) -> Self;
    fn audio_sample_rate(self, rate: u32) -> Self;
    fn audio_channels(self, channels: u32) -> Self;
    fn copy_streams(self) -> Self;
    fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self;
}

impl FfmpegArgs for ToolCommand {
    fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").path(path)
    }

    fn output_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.path(path)
    }

    /// Force overwrite output
    fn overwrite(self) -> Self {
        self.arg("-y")
    }

    fn no_video(self) -> Self {
        self.arg("-vn")
    }

    fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Copy every existing stream as-is
    fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:s").arg(codec)
    }
}

/// Builder for the media commands the pipeline needs
pub struct MediaCommandBuilder {
    config: MediaConfig,
}

impl MediaCommandBuilder {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Build duration probe command
    pub fn probe_duration<P: AsRef<Path>>(&self, video_path: P) -> ToolCommand {
        ToolCommand::new(&self.config.ffprobe_path, "Duration probe")
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .path(video_path)
    }

    /// Build audio extraction command
    pub fn extract_audio<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: Q,
    ) -> ToolCommand {
        ToolCommand::new(&self.config.ffmpeg_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(self.config.sample_rate)
            .audio_channels(self.config.channels)
            .output_file(audio_path)
    }

    /// Build subtitle muxing command
    pub fn embed_subtitles<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: Q,
        output_path: R,
    ) -> ToolCommand {
        ToolCommand::new(&self.config.ffmpeg_path, "Subtitle muxing")
            .overwrite()
            .input(video_path)
            .input(subtitle_path)
            .copy_streams()
            .subtitle_codec(&self.config.subtitle_codec)
            .output_file(output_path)
    }

    /// Build version check commands for ffmpeg and ffprobe
    pub fn version_checks(&self) -> Vec<ToolCommand> {
        [&self.config.ffmpeg_path, &self.config.ffprobe_path]
            .into_iter()
            .map(|binary| {
                ToolCommand::new(binary, format!("{} version check", binary)).arg("-version")
            })
            .collect()
    }
}

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, VosubError};

/// Offset from the start of the video, kept at microsecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    /// Build a timestamp from seconds, rounded to the nearest microsecond.
    ///
    /// Rounding happens before the millisecond truncation done by `Display`,
    /// so `1.9999999999` still renders as `00:00:02,000`.
    pub fn from_secs_f64(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(VosubError::InvalidDuration(format!(
                "cannot build a timestamp from {} seconds",
                seconds
            )));
        }
        let micros = (seconds * 1_000_000.0).round() as u64;
        Ok(Self(Duration::from_micros(micros)))
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    pub fn as_millis(&self) -> u128 {
        self.0.as_millis()
    }
}

/// Formats as `HH:MM:SS,mmm`; hours keep growing past 24
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_milliseconds = self.0.as_millis();
        let hours = total_milliseconds / 3_600_000;
        let minutes = (total_milliseconds % 3_600_000) / 60_000;
        let secs = (total_milliseconds % 60_000) / 1_000;
        let millis = total_milliseconds % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

impl FromStr for Timestamp {
    type Err = VosubError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || VosubError::Subtitle(format!("Invalid SRT timestamp: '{}'", s));

        let (clock, millis) = s.trim().split_once(',').ok_or_else(invalid)?;
        let mut parts = clock.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let hours: u64 = h.parse().map_err(|_| invalid())?;
        let minutes: u64 = m.parse().map_err(|_| invalid())?;
        let seconds: u64 = sec.parse().map_err(|_| invalid())?;
        let millis: u64 = millis.parse().map_err(|_| invalid())?;
        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(invalid());
        }

        Ok(Self::from_millis(
            ((hours * 60 + minutes) * 60 + seconds) * 1000 + millis,
        ))
    }
}

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub index: usize,
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: String,
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n\n",
            self.index, self.start, self.end, self.text
        )
    }
}

/// Spread the non-blank transcript lines uniformly over `duration` seconds.
///
/// Blank lines are skipped and consume no index. The duration is validated
/// before any arithmetic, and a transcript without usable lines is rejected
/// instead of dividing by zero.
pub fn synthesize<S: AsRef<str>>(lines: &[S], duration: f64) -> Result<Vec<Cue>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(VosubError::InvalidDuration(format!(
            "expected a positive number of seconds, got {}",
            duration
        )));
    }

    let texts: Vec<&str> = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .collect();

    if texts.is_empty() {
        return Err(VosubError::EmptyTranscript);
    }

    let increment = duration / texts.len() as f64;
    debug!("Allocating {:.3}s to each of {} cues", increment, texts.len());

    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| -> Result<Cue> {
            Ok(Cue {
                index: i + 1,
                start: Timestamp::from_secs_f64(i as f64 * increment)?,
                end: Timestamp::from_secs_f64((i + 1) as f64 * increment)?,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Serialize cues as SubRip text
pub fn to_srt(cues: &[Cue]) -> String {
    cues.iter().map(|cue| cue.to_string()).collect()
}

/// Read SubRip text back into cues
pub fn parse_srt(content: &str) -> Result<Vec<Cue>> {
    let normalized = content.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().skip_while(|line| line.trim().is_empty());
        let Some(index_line) = lines.next() else {
            continue;
        };

        let index: usize = index_line.trim().parse().map_err(|_| {
            VosubError::Subtitle(format!("Invalid cue index: '{}'", index_line))
        })?;

        let timing = lines
            .next()
            .ok_or_else(|| VosubError::Subtitle(format!("Cue {} has no timing line", index)))?;
        let (start, end) = timing.split_once("-->").ok_or_else(|| {
            VosubError::Subtitle(format!("Invalid timing line in cue {}: '{}'", index, timing))
        })?;

        cues.push(Cue {
            index,
            start: start.parse()?,
            end: end.parse()?,
            text: lines.collect::<Vec<_>>().join("\n"),
        });
    }

    Ok(cues)
}

/// Generate an SRT file from a plain-text transcript.
///
/// Nothing is written unless synthesis succeeds. Returns the number of cues.
pub async fn generate_srt<P: AsRef<Path>, Q: AsRef<Path>>(
    transcript_path: P,
    output_path: Q,
    duration: f64,
) -> Result<usize> {
    let transcript_path = transcript_path.as_ref();
    let output_path = output_path.as_ref();
    info!(
        "Generating SRT file {} from {}",
        output_path.display(),
        transcript_path.display()
    );

    let transcript = fs::read_to_string(transcript_path).await?;
    let lines: Vec<&str> = transcript.lines().collect();
    let cues = synthesize(&lines, duration)?;

    fs::write(output_path, to_srt(&cues)).await?;

    info!("SRT file generated with {} cues", cues.len());
    Ok(cues.len())
}

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

/// Sample rate of larynx's raw stream.
pub const LARYNX_SAMPLE_RATE: u32 = 22_050;

/// Turns text into a decodable audio byte stream.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str) -> Result<Vec<u8>>;
}

static UNSPEAKABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\p{L}\p{N}\s'".,:;!?\-]+"#).expect("sanitizer pattern is valid")
});

/// Strip characters a synthesizer would read out literally or choke on.
/// Letters and digits of any script survive, as do whitespace and basic
/// punctuation.
pub fn sanitize_text(text: &str) -> String {
    UNSPEAKABLE.replace_all(text, "").into_owned()
}

/// Wrap raw little-endian 16-bit mono PCM in a WAV container.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    if pcm.len() % 2 != 0 {
        debug!(len = pcm.len(), "dropping trailing odd PCM byte");
    }

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("failed to start WAV stream")?;
        for sample in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
                .context("failed to write WAV sample")?;
        }
        writer.finalize().context("failed to finish WAV stream")?;
    }
    Ok(cursor.into_inner())
}

/// Local synthesis through the `larynx` executable.
#[derive(Debug, Clone)]
pub struct LarynxSpeaker {
    pub program: PathBuf,
    pub voice: Option<String>,
}

impl LarynxSpeaker {
    pub fn new(voice: Option<String>) -> Self {
        Self {
            program: PathBuf::from("larynx"),
            voice,
        }
    }
}

impl Default for LarynxSpeaker {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Speaker for LarynxSpeaker {
    fn speak(&self, text: &str) -> Result<Vec<u8>> {
        let text = sanitize_text(text);

        let mut command = Command::new(&self.program);
        if let Some(voice) = &self.voice {
            command.arg("--voice").arg(voice);
        }
        let output = command
            .arg("--raw-stream")
            .arg(&text)
            .output()
            .with_context(|| {
                format!("failed to run {} (is it installed?)", self.program.display())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "larynx exited with an error");
            return Err(anyhow!("larynx failed: {}", stderr.trim()));
        }

        debug!(pcm_bytes = output.stdout.len(), "larynx finished");
        pcm_to_wav(&output.stdout, LARYNX_SAMPLE_RATE)
    }
}

#[derive(Debug, Serialize)]
struct SpeakQuery<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
}

/// Remote synthesis: `GET <endpoint>?text=..&voice=..` returning audio bytes
/// (the larynx and MaryTTS HTTP servers both answer this).
#[derive(Debug, Clone)]
pub struct HttpSpeaker {
    pub endpoint: String,
    pub voice: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpSpeaker {
    pub fn new(endpoint: impl Into<String>, voice: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            voice,
            client,
        })
    }
}

impl Speaker for HttpSpeaker {
    fn speak(&self, text: &str) -> Result<Vec<u8>> {
        let text = sanitize_text(text);
        let query = SpeakQuery {
            text: &text,
            voice: self.voice.as_deref(),
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!(
                "speech server returned {}: {}",
                status,
                body.trim()
            ));
        }

        let audio = response.bytes().context("failed to read speech response")?;
        debug!(bytes = audio.len(), "speech server answered");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_letters_of_any_script() {
        assert_eq!(
            sanitize_text("Καλημέρα, κόσμε! <b>#1</b>"),
            "Καλημέρα, κόσμε! b1b"
        );
        assert_eq!(sanitize_text("it's \"fine\" - really?"), "it's \"fine\" - really?");
        assert_eq!(sanitize_text("a*b|c~d"), "abcd");
    }

    #[test]
    fn wav_header_matches_the_stream() {
        let samples: [i16; 4] = [0, 1000, -1000, i16::MAX];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let wav = pcm_to_wav(&pcm, LARYNX_SAMPLE_RATE).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 22_050);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let wav = pcm_to_wav(&[1, 0, 7], 8000).unwrap();
        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn missing_larynx_is_reported() {
        let speaker = LarynxSpeaker {
            program: PathBuf::from("/nonexistent/larynx"),
            voice: None,
        };
        let err = speaker.speak("hello").unwrap_err();
        assert!(err.to_string().contains("is it installed"), "{err}");
    }

    #[test]
    fn unreachable_server_is_an_error() {
        let speaker = HttpSpeaker::new("http://127.0.0.1:9/api/tts", None).unwrap();
        assert!(speaker.speak("hello").is_err());
    }
}

//! Stub transcoding engine for pipeline tests.
//!
//! "Transcoding" copies bytes, probing reports a fixed duration and any
//! input whose content contains `CORRUPT` fails. Acquisitions and
//! shutdowns are counted so tests can assert the engine lifecycle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pressroom_ingest_server::audio::{
    AudioProbe, PreviewSpec, TranscodeEngine, TranscodeEngineFactory, TranscodeError,
};

pub struct StubEngineFactory {
    scratch_base: PathBuf,
    delay_ms: u64,
    acquisitions: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
}

impl StubEngineFactory {
    pub fn new(scratch_base: PathBuf, delay_ms: u64) -> Self {
        Self {
            scratch_base,
            delay_ms,
            acquisitions: Arc::new(AtomicUsize::new(0)),
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn acquisitions(&self) -> Arc<AtomicUsize> {
        self.acquisitions.clone()
    }

    pub fn shutdowns(&self) -> Arc<AtomicUsize> {
        self.shutdowns.clone()
    }
}

#[async_trait]
impl TranscodeEngineFactory for StubEngineFactory {
    async fn acquire(&self) -> Result<Box<dyn TranscodeEngine>, TranscodeError> {
        let n = self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let scratch = self.scratch_base.join(format!("engine-{}", n));
        tokio::fs::create_dir_all(&scratch).await?;

        Ok(Box::new(StubEngine {
            scratch,
            delay_ms: self.delay_ms,
            shutdowns: self.shutdowns.clone(),
        }))
    }
}

pub struct StubEngine {
    scratch: PathBuf,
    delay_ms: u64,
    shutdowns: Arc<AtomicUsize>,
}

impl StubEngine {
    async fn check(input: &Path) -> Result<(), TranscodeError> {
        let data = tokio::fs::read(input).await?;
        if data.windows(7).any(|w| w == b"CORRUPT") {
            Err(TranscodeError::TranscodeFailed("bad stream".to_string()))
        } else {
            Ok(())
        }
    }

    async fn fake_transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        Self::check(input).await?;
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

#[async_trait]
impl TranscodeEngine for StubEngine {
    async fn probe(&self, input: &Path) -> Result<AudioProbe, TranscodeError> {
        Self::check(input).await?;
        Ok(AudioProbe {
            duration_secs: 180.0,
            codec: "pcm_s16le".to_string(),
            sample_rate: Some(44_100),
            channels: Some(2),
            format: "wav".to_string(),
        })
    }

    async fn transcode_to_mp3(
        &self,
        input: &Path,
        output: &Path,
        _bitrate_kbps: u32,
    ) -> Result<(), TranscodeError> {
        self.fake_transcode(input, output).await
    }

    async fn transcode_to_wav(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.fake_transcode(input, output).await
    }

    async fn extract_preview(
        &self,
        input: &Path,
        output: &Path,
        _spec: &PreviewSpec,
    ) -> Result<(), TranscodeError> {
        self.fake_transcode(input, output).await
    }

    fn scratch_dir(&self) -> &Path {
        &self.scratch
    }

    async fn shutdown(&self) -> Result<(), TranscodeError> {
        if self.scratch.exists() {
            tokio::fs::remove_dir_all(&self.scratch).await?;
        }
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

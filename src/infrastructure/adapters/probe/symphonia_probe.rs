//! Symphonia Probe - 媒体时长探测
//!
//! 对落盘后的 wav / mp4 做时长探测。尽力而为：
//! 任何失败都返回 None，由调用方回退默认时长。

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::MediaProbePort;

/// Symphonia 时长探测器
pub struct SymphoniaProbe;

impl SymphoniaProbe {
    pub fn new() -> Self {
        Self
    }

    fn probe(path: &Path) -> Option<u32> {
        let file = File::open(path).ok()?;
        let stream = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .ok()?;

        let track = probed.format.default_track()?;
        let params = &track.codec_params;
        let time_base = params.time_base?;
        let n_frames = params.n_frames?;

        let time = time_base.calc_time(n_frames);
        Some((time.seconds as f64 + time.frac).round() as u32)
    }
}

impl Default for SymphoniaProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaProbePort for SymphoniaProbe {
    fn duration_secs(&self, path: &Path) -> Option<u32> {
        match Self::probe(path) {
            Some(secs) => {
                tracing::debug!(file = %path.display(), duration_secs = secs, "Media duration probed");
                Some(secs)
            }
            None => {
                tracing::warn!(file = %path.display(), "Failed to probe media duration");
                None
            }
        }
    }
}

/// 固定时长探测器（测试用）
pub struct FixedProbe(pub Option<u32>);

impl MediaProbePort for FixedProbe {
    fn duration_secs(&self, _path: &Path) -> Option<u32> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    /// 最小可解析的 PCM WAV：44 字节头 + 1 秒 8kHz 单声道静音
    fn write_minimal_wav(path: &Path, sample_rate: u32, seconds: u32) {
        let num_samples = sample_rate * seconds;
        let data_len = num_samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);

        let mut file = File::create(path).unwrap();
        file.write_all(&bytes).unwrap();
    }

    #[test]
    fn test_probe_wav_duration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_minimal_wav(&path, 8000, 2);

        let probe = SymphoniaProbe::new();
        assert_eq!(probe.duration_secs(&path), Some(2));
    }

    #[test]
    fn test_probe_garbage_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_media.bin");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let probe = SymphoniaProbe::new();
        assert_eq!(probe.duration_secs(&path), None);
    }
}

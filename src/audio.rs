use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes float samples as a mono 16-bit PCM WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let data_size = (samples.len() * 2) as u32;

    let mut out =
        File::create(path).with_context(|| format!("Failed to create WAV file {:?}", path))?;

    // RIFF [4] + Size [4] + WAVE [4]
    out.write_all(b"RIFF")?;
    // File Size = 4 (WAVE) + 8 (fmt hdr) + 16 + 8 (data hdr) + data_len
    out.write_all(&(4 + 8 + 16 + 8 + data_size).to_le_bytes())?;
    out.write_all(b"WAVE")?;

    // fmt chunk: PCM (1), Mono (1), SampleRate, ByteRate, BlockAlign (2), Bits (16)
    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?;
    out.write_all(&sample_rate.to_le_bytes())?;
    out.write_all(&(sample_rate * 2).to_le_bytes())?;
    out.write_all(&2u16.to_le_bytes())?;
    out.write_all(&16u16.to_le_bytes())?;

    // data chunk
    out.write_all(b"data")?;
    out.write_all(&data_size.to_le_bytes())?;
    for sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        out.write_all(&pcm.to_le_bytes())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_header_and_size() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.wav");

        write_wav(&path, &[0.0, 0.5, -0.5, 1.0], 24000)?;

        let bytes = std::fs::read(&path)?;
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");
        // 4 samples, 2 bytes each.
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into()?), 8);
        assert_eq!(bytes.len(), 44 + 8);
        // Sample rate field.
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into()?), 24000);
        Ok(())
    }

    #[test]
    fn test_samples_are_clamped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("clip.wav");

        write_wav(&path, &[2.0, -2.0], 24000)?;

        let bytes = std::fs::read(&path)?;
        let first = i16::from_le_bytes(bytes[44..46].try_into()?);
        let second = i16::from_le_bytes(bytes[46..48].try_into()?);
        assert_eq!(first, i16::MAX);
        assert_eq!(second, -i16::MAX);
        Ok(())
    }
}

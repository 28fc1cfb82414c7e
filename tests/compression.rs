use anyhow::Result;
use rollcall::io::compression::{
    CompressionCodec, InputReader, auto_detect_reader, codec_names, open_input, register_codec,
};
use std::io::Read;
use std::sync::Arc;

const CSV: &str = "name,age,sex,class,number,score\nJohn,20,Male,A1,001,{}\n";

fn read_all(mut reader: InputReader) -> Result<String> {
    let mut out = String::new();
    reader.read_to_string(&mut out)?;
    Ok(out)
}

#[test]
fn plain_file_passes_through() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plain.csv");
    std::fs::write(&path, CSV)?;
    assert_eq!(read_all(open_input(&path)?)?, CSV);
    Ok(())
}

#[test]
fn missing_file_error_names_path() {
    let err = open_input("/nope/missing.csv").err().unwrap();
    assert!(format!("{err:#}").contains("/nope/missing.csv"));
}

#[test]
fn directory_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let err = open_input(dir.path()).err().unwrap();
    assert!(err.to_string().contains("not a regular file"));
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_by_extension_and_by_magic() -> Result<()> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(CSV.as_bytes())?;
    let bytes = enc.finish()?;

    let dir = tempfile::tempdir()?;
    let by_ext = dir.path().join("roster.csv.GZ");
    let by_magic = dir.path().join("uploaded.csv");
    std::fs::write(&by_ext, &bytes)?;
    std::fs::write(&by_magic, &bytes)?;

    assert_eq!(read_all(open_input(&by_ext)?)?, CSV);
    assert_eq!(read_all(open_input(&by_magic)?)?, CSV);
    Ok(())
}

#[cfg(feature = "compression-zstd")]
#[test]
fn zstd_by_extension() -> Result<()> {
    let bytes = zstd::stream::encode_all(CSV.as_bytes(), 3)?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roster.csv.zst");
    std::fs::write(&path, bytes)?;
    assert_eq!(read_all(open_input(&path)?)?, CSV);
    Ok(())
}

#[cfg(feature = "compression-bzip2")]
#[test]
fn bzip2_by_magic() -> Result<()> {
    use bzip2::Compression;
    use bzip2::write::BzEncoder;
    use std::io::Write;

    let mut enc = BzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(CSV.as_bytes())?;
    let bytes = enc.finish()?;
    let reader = auto_detect_reader(std::io::Cursor::new(bytes), "upload.bin")?;
    assert_eq!(read_all(reader)?, CSV);
    Ok(())
}

#[cfg(feature = "compression-xz")]
#[test]
fn xz_by_extension() -> Result<()> {
    use std::io::Write;
    use xz2::write::XzEncoder;

    let mut enc = XzEncoder::new(Vec::new(), 6);
    enc.write_all(CSV.as_bytes())?;
    let bytes = enc.finish()?;
    let reader = auto_detect_reader(std::io::Cursor::new(bytes), "roster.csv.xz")?;
    assert_eq!(read_all(reader)?, CSV);
    Ok(())
}

/// Upper-cases ASCII, to prove a registered codec is applied.
struct Shouting;

struct ShoutingReader(InputReader);

impl Read for ShoutingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.0.read(buf)?;
        buf[..n].make_ascii_uppercase();
        Ok(n)
    }
}

impl CompressionCodec for Shouting {
    fn name(&self) -> &str {
        "shouting"
    }

    fn extensions(&self) -> &[&str] {
        &[".shout"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    fn wrap_reader(&self, reader: InputReader) -> std::io::Result<InputReader> {
        Ok(Box::new(ShoutingReader(reader)))
    }
}

#[test]
fn registered_codec_is_detected() -> Result<()> {
    register_codec(Arc::new(Shouting));
    assert!(codec_names().iter().any(|n| n == "shouting"));

    let reader = auto_detect_reader(std::io::Cursor::new(b"abc".to_vec()), "x.shout")?;
    assert_eq!(read_all(reader)?, "ABC");
    Ok(())
}

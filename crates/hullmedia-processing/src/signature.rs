//! Magic-number classification of image files.

use std::io::{self, Read, Seek, SeekFrom};

/// Number of header bytes inspected when sniffing.
pub const SIGNATURE_PROBE_LEN: usize = 16;

/// Image formats accepted by the upload pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Tiff,
}

impl ImageKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
            ImageKind::Bmp => "image/bmp",
            ImageKind::Tiff => "image/tiff",
        }
    }
}

/// Classify a file by its leading bytes.
pub fn sniff(header: &[u8]) -> Option<ImageKind> {
    let starts = |sig: &[u8]| header.len() >= sig.len() && &header[..sig.len()] == sig;

    if starts(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageKind::Jpeg);
    }
    if starts(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageKind::Png);
    }
    if starts(b"GIF87a") || starts(b"GIF89a") {
        return Some(ImageKind::Gif);
    }
    if header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WEBP" {
        return Some(ImageKind::Webp);
    }
    if starts(b"BM") {
        return Some(ImageKind::Bmp);
    }
    // classic TIFF, then BigTIFF, in both byte orders
    if starts(&[b'I', b'I', 0x2A, 0x00])
        || starts(&[b'M', b'M', 0x00, 0x2A])
        || starts(&[b'I', b'I', 0x2B, 0x00])
        || starts(&[b'M', b'M', 0x00, 0x2B])
    {
        return Some(ImageKind::Tiff);
    }
    None
}

/// Read up to [`SIGNATURE_PROBE_LEN`] bytes and classify them.
///
/// The reader is always returned to the position it had on entry.
pub fn sniff_reader<R: Read + Seek>(reader: &mut R) -> io::Result<Option<ImageKind>> {
    let start = reader.stream_position()?;
    let mut header = [0u8; SIGNATURE_PROBE_LEN];
    let mut filled = 0;
    let result = loop {
        match reader.read(&mut header[filled..]) {
            Ok(0) => break Ok(()),
            Ok(n) => {
                filled += n;
                if filled == SIGNATURE_PROBE_LEN {
                    break Ok(());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break Err(e),
        }
    };
    reader.seek(SeekFrom::Start(start))?;
    result?;
    Ok(sniff(&header[..filled]))
}

/// Whether the reader starts with a supported image signature.
pub fn is_supported_image<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    Ok(sniff_reader(reader)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sniff_known_signatures() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(
            sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0]),
            Some(ImageKind::Png)
        );
        assert_eq!(sniff(b"GIF89a......"), Some(ImageKind::Gif));
        assert_eq!(sniff(b"GIF87a"), Some(ImageKind::Gif));
        assert_eq!(sniff(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(sniff(b"BM\x00\x00"), Some(ImageKind::Bmp));
        assert_eq!(sniff(b"II*\x00"), Some(ImageKind::Tiff));
        assert_eq!(sniff(b"MM\x00*"), Some(ImageKind::Tiff));
        assert_eq!(sniff(b"II+\x00"), Some(ImageKind::Tiff));
    }

    #[test]
    fn test_sniff_rejects_other_content() {
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(b"%PDF-1.7"), None);
        assert_eq!(sniff(b"RIFF\x10\x00\x00\x00WAVE"), None);
        assert_eq!(sniff(&[0xFF, 0xD8]), None);
        assert_eq!(sniff(b"hello world, not an image"), None);
    }

    #[test]
    fn test_is_supported_image_rewinds() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        data.extend_from_slice(&[0u8; 32]);
        let mut cursor = Cursor::new(data);
        cursor.set_position(4);

        assert!(is_supported_image(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 4);

        let mut text = Cursor::new(b"plain text".to_vec());
        assert!(!is_supported_image(&mut text).unwrap());
        assert_eq!(text.position(), 0);
    }
}

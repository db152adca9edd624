pub mod image_helper {
    use crate::core_modules::renderer::Frame;
    use crate::error::Result;
    use image::ImageEncoder;
    use image::codecs::jpeg::JpegEncoder;
    use image::codecs::png::PngEncoder;
    use std::io::{BufWriter, Write};
    use std::path::Path;

    pub const DEFAULT_JPEG_QUALITY: u8 = 80;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "web", serde(rename_all = "lowercase"))]
    pub enum FrameFormat {
        Jpeg,
        Png,
    }

    fn write_png<W: Write>(output: W, frame: &Frame) -> Result<()> {
        let encoder = PngEncoder::new(output);
        encoder.write_image(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(())
    }

    /// Encodes a frame for transport. `jpeg_quality` is ignored for PNG.
    pub fn encode(frame: &Frame, format: FrameFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        match format {
            FrameFormat::Jpeg => {
                let quality = jpeg_quality.clamp(1, 100);
                let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
                encoder.encode_image(frame)?;
            }
            FrameFormat::Png => write_png(&mut bytes, frame)?,
        }
        Ok(bytes)
    }

    pub fn save_png(path: impl AsRef<Path>, frame: &Frame) -> Result<()> {
        let output = BufWriter::new(std::fs::File::create(path)?);
        write_png(output, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;
    use crate::core_modules::renderer::BinRenderer;

    #[test]
    fn encodes_frames_with_their_magic_bytes() {
        let frame = BinRenderer::default().render(40, 95, 0.0, None);

        let png = encode(&frame, FrameFormat::Png, DEFAULT_JPEG_QUALITY).expect("png encode");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let jpeg = encode(&frame, FrameFormat::Jpeg, DEFAULT_JPEG_QUALITY).expect("jpeg encode");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn saved_png_decodes_to_the_same_frame() {
        let frame = BinRenderer::default().render(100, 20, 45.0, None);
        let path = std::env::temp_dir().join(format!("trashlink_frame_{}.png", std::process::id()));

        save_png(&path, &frame).expect("Error Saving File.");
        let decoded = image::open(&path).expect("decode").to_rgb8();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded, frame);
    }
}

/// 验证文件内容的魔术字节是否与扩展名匹配
///
/// # Arguments
/// * `data` - 文件内容的前几个字节
/// * `extension` - 文件扩展名（不区分大小写，可带点号）
///
/// # Returns
/// * `true` - 魔术字节匹配或该类型不需要验证
/// * `false` - 魔术字节不匹配
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match normalize(extension).as_str() {
        // 图片格式
        "png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        "jpg" | "jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        "webp" => riff_form(data, b"WEBP"),
        "bmp" => data.starts_with(b"BM"),

        // 音频格式
        "mp3" => data.starts_with(b"ID3") || mpeg_frame_sync(data),
        "wav" => riff_form(data, b"WAVE"),
        "ogg" => data.starts_with(b"OggS"),
        "m4a" => iso_media(data),
        // ADTS 帧头
        "aac" => data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xF6) == 0xF0,

        // 视频格式
        "mp4" | "mov" => iso_media(data),
        "webm" | "mkv" => data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
        "avi" => riff_form(data, b"AVI "),

        // 文档格式
        "pdf" => data.starts_with(b"%PDF"),
        "doc" | "xls" | "ppt" => {
            // MS Office 旧格式 (OLE Compound Document)
            data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        }
        "docx" | "xlsx" | "pptx" => {
            // MS Office 新格式 (ZIP-based OOXML)
            data.starts_with(&[0x50, 0x4B, 0x03, 0x04])
        }

        // 压缩格式
        "zip" => data.starts_with(&[0x50, 0x4B, 0x03, 0x04]),
        "rar" => data.starts_with(b"Rar!"),
        "7z" => data.starts_with(&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C]),
        "gz" => data.starts_with(&[0x1F, 0x8B]),
        // tar 的 "ustar" 标识在偏移 257 处，首块可能不足
        "tar" => true,

        // 文本格式 - 不检查魔术字节
        "txt" | "md" | "json" | "csv" => true,

        // 未知格式 - 默认拒绝
        _ => false,
    }
}

/// 根据扩展名推断 MIME 类型
pub fn mime_type_for(extension: &str) -> &'static str {
    match normalize(extension).as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "7z" => "application/x-7z-compressed",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        _ => "application/octet-stream",
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

fn riff_form(data: &[u8], form: &[u8; 4]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == form
}

// ISO Base Media (mp4/m4a/mov) 在偏移 4 处为 "ftyp"
fn iso_media(data: &[u8]) -> bool {
    data.len() >= 8 && &data[4..8] == b"ftyp"
}

// 无 ID3 标签的 MPEG 音频帧同步字
fn mpeg_frame_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xE0) == 0xE0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(validate_magic_bytes(&png_header, "png"));
        assert!(validate_magic_bytes(&png_header, ".PNG"));
        assert!(!validate_magic_bytes(&png_header, "jpg"));
    }

    #[test]
    fn test_jpeg_magic() {
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0];
        assert!(validate_magic_bytes(&jpeg_header, "jpg"));
        assert!(validate_magic_bytes(&jpeg_header, "jpeg"));
        assert!(!validate_magic_bytes(&jpeg_header, "png"));
    }

    #[test]
    fn test_pdf_magic() {
        let pdf_header = b"%PDF-1.4";
        assert!(validate_magic_bytes(pdf_header, "pdf"));
        assert!(!validate_magic_bytes(pdf_header, "doc"));
    }

    #[test]
    fn test_audio_magic() {
        assert!(validate_magic_bytes(b"ID3\x04\x00", "mp3"));
        assert!(validate_magic_bytes(&[0xFF, 0xFB, 0x90, 0x64], "mp3"));
        assert!(validate_magic_bytes(b"RIFF\x24\x08\x00\x00WAVEfmt ", "wav"));
        assert!(!validate_magic_bytes(b"RIFF\x24\x08\x00\x00AVI LIST", "wav"));
        assert!(validate_magic_bytes(b"OggS\x00\x02", "ogg"));
        assert!(validate_magic_bytes(b"\x00\x00\x00\x20ftypM4A ", "m4a"));
    }

    #[test]
    fn test_video_magic() {
        assert!(validate_magic_bytes(b"\x00\x00\x00\x18ftypmp42", "mp4"));
        assert!(validate_magic_bytes(b"\x00\x00\x00\x14ftypqt  ", "mov"));
        assert!(validate_magic_bytes(&[0x1A, 0x45, 0xDF, 0xA3, 0x01], "webm"));
        assert!(validate_magic_bytes(&[0x1A, 0x45, 0xDF, 0xA3, 0x01], "mkv"));
        assert!(validate_magic_bytes(b"RIFF\x00\x00\x00\x00AVI LIST", "avi"));
        assert!(!validate_magic_bytes(b"%PDF-1.4", "mp4"));
    }

    #[test]
    fn test_office_and_archive_magic() {
        let zip = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00];
        assert!(validate_magic_bytes(&zip, "docx"));
        assert!(validate_magic_bytes(&zip, "zip"));
        assert!(validate_magic_bytes(b"Rar!\x1A\x07", "rar"));
        assert!(validate_magic_bytes(&[0x1F, 0x8B, 0x08], "gz"));
    }

    #[test]
    fn test_text_formats_skip_check() {
        assert!(validate_magic_bytes(b"hello", "txt"));
        assert!(validate_magic_bytes(b"# title", "md"));
        assert!(validate_magic_bytes(b"a,b", "csv"));
    }

    #[test]
    fn test_empty_and_unknown_rejected() {
        assert!(!validate_magic_bytes(&[], "txt"));
        assert!(!validate_magic_bytes(b"MZ\x90\x00", "exe"));
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for("MP3"), "audio/mpeg");
        assert_eq!(mime_type_for(".png"), "image/png");
        assert_eq!(mime_type_for("xyz"), "application/octet-stream");
    }
}

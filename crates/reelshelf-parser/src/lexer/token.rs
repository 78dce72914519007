//! Token types for the Logos-based noise lexer.

use logos::Logos;

/// Release-name noise recognized as whole words.
///
/// Only tokens that are very unlikely to be part of a real title are listed;
/// generic words such as "web" or "dvd" are left alone.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Video resolution (e.g., 2160p, 1080p, 720p, 4K, UHD)
    #[regex(r"(?i)((4320|2160|1440|1080|720|576|480|360)[pi]|4k|8k|uhd)", priority = 10)]
    Resolution,

    /// Disc, web and broadcast sources
    #[regex(
        r"(?i)(bluray|blu-ray|brrip|bdrip|bdremux|remux|dvdrip|dvdscr|webrip|web-dl|webdl|hdtv|hdrip|hdcam)",
        priority = 9
    )]
    Source,

    /// Video codecs and bit depth
    #[regex(r"(?i)(x264|x265|h264|h265|hevc|avc|xvid|divx|av1|10bit|8bit)", priority = 8)]
    Codec,

    /// Audio formats
    #[regex(r"(?i)(aac[0-9]?|e?ac3|dts|dts-hd|dts-x|truehd|atmos|flac|ddp?[257])", priority = 7)]
    Audio,

    /// Release flags and editions
    #[regex(r"(?i)(proper|repack|extended|unrated|remastered|hdr|hdr10|dv)", priority = 6)]
    Flag,

    /// Container names left in the stem
    #[regex(r"(?i)(mkv|mp4|avi|m4v)", priority = 5)]
    Container,
}

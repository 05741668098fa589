//! Printer sink abstractions and implementations

mod command;
mod log;

pub use command::CommandPrintSink;
pub use log::LogPrintSink;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// Image binarization algorithm used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Binarization {
    MeanThreshold,
    FloydSteinberg,
    Atkinson,
    Halftone,
    None,
}

impl Binarization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MeanThreshold => "mean-threshold",
            Self::FloydSteinberg => "floyd-steinberg",
            Self::Atkinson => "atkinson",
            Self::Halftone => "halftone",
            Self::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mean-threshold" | "mean_threshold" => Some(Self::MeanThreshold),
            "floyd-steinberg" | "floyd_steinberg" => Some(Self::FloydSteinberg),
            "atkinson" => Some(Self::Atkinson),
            "halftone" => Some(Self::Halftone),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl std::fmt::Display for Binarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rendering options passed through to the printer untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub font_size: Option<u32>,
    /// Image width in pixels
    pub width: Option<u32>,
    pub padding: Option<u32>,
    pub binarization: Option<Binarization>,
    /// Thermal energy, e.g. `0xffff`
    pub energy: Option<String>,
    /// BLE address or advertisement name of the printer
    pub device: Option<String>,
    /// Raw arguments placed before the typed options
    pub extra_args: Vec<String>,
}

impl RenderOptions {
    /// Split a whitespace-separated argument string into `extra_args`.
    pub fn with_extra_args(mut self, args: &str) -> Self {
        self.extra_args = args.split_whitespace().map(str::to_string).collect();
        self
    }

    /// Command-line form understood by the render-and-print script.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.extra_args.clone();
        if let Some(font_size) = self.font_size {
            args.extend(["-f".to_string(), font_size.to_string()]);
        }
        if let Some(width) = self.width {
            args.extend(["-w".to_string(), width.to_string()]);
        }
        if let Some(padding) = self.padding {
            args.extend(["-p".to_string(), padding.to_string()]);
        }
        if let Some(binarization) = self.binarization {
            args.extend(["-b".to_string(), binarization.to_string()]);
        }
        if let Some(ref energy) = self.energy {
            args.extend(["-e".to_string(), energy.clone()]);
        }
        if let Some(ref device) = self.device {
            args.extend(["-d".to_string(), device.clone()]);
        }
        args
    }
}

/// Render-and-print collaborator invoked once per accepted message
#[async_trait]
pub trait PrintSink: Send + Sync {
    /// Render `text` and print it. Retrying is up to the implementation.
    async fn render_and_print(&self, text: &str, options: &RenderOptions)
        -> Result<(), SinkError>;

    /// Get the name of this sink (for logging/debugging)
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarization_from_str() {
        assert_eq!(
            Binarization::from_str("floyd-steinberg"),
            Some(Binarization::FloydSteinberg)
        );
        assert_eq!(
            Binarization::from_str("MEAN_THRESHOLD"),
            Some(Binarization::MeanThreshold)
        );
        assert_eq!(Binarization::from_str("dither"), None);
    }

    #[test]
    fn test_binarization_serialization() {
        let json = serde_json::to_string(&Binarization::MeanThreshold).unwrap();
        assert_eq!(json, "\"mean-threshold\"");
    }

    #[test]
    fn test_default_options_render_no_args() {
        assert!(RenderOptions::default().to_args().is_empty());
    }

    #[test]
    fn test_options_render_in_order() {
        let options = RenderOptions {
            font_size: Some(32),
            width: Some(384),
            padding: Some(10),
            binarization: Some(Binarization::Atkinson),
            energy: Some("0x8000".to_string()),
            device: Some("MX06".to_string()),
            extra_args: vec![],
        }
        .with_extra_args("  -s   --verbose ");

        assert_eq!(
            options.to_args(),
            vec![
                "-s", "--verbose", "-f", "32", "-w", "384", "-p", "10", "-b", "atkinson", "-e",
                "0x8000", "-d", "MX06"
            ]
        );
    }
}

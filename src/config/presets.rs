//! Preset target widths

use serde::{Deserialize, Serialize};

/// The fixed list of preset widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthPreset {
    /// 150px, for thumbnails
    Thumbnail,
    /// 800px, for email and chat
    Small,
    /// 1024px, for the web
    Medium,
    /// 1600px, for full-screen viewing
    Large,
}

impl WidthPreset {
    pub const ALL: [WidthPreset; 4] = [
        WidthPreset::Thumbnail,
        WidthPreset::Small,
        WidthPreset::Medium,
        WidthPreset::Large,
    ];

    /// Target width in pixels
    pub fn width(self) -> u32 {
        match self {
            Self::Thumbnail => 150,
            Self::Small => 800,
            Self::Medium => 1024,
            Self::Large => 1600,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Thumbnail => "Thumbnails and previews",
            Self::Small => "Email attachments and messaging",
            Self::Medium => "Web pages and blogs",
            Self::Large => "Full-screen viewing",
        }
    }

    /// Find the preset for an exact width
    pub fn from_width(width: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.width() == width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_widths() {
        let widths: Vec<u32> = WidthPreset::ALL.iter().map(|p| p.width()).collect();
        assert_eq!(widths, vec![150, 800, 1024, 1600]);
    }

    #[test]
    fn test_from_width() {
        assert_eq!(WidthPreset::from_width(1024), Some(WidthPreset::Medium));
        assert_eq!(WidthPreset::from_width(1000), None);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingConfig {
    pub enabled: bool,
    pub cta: String,
    pub headline: String,
    pub subheadline: String,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cta: "Request Early Access".into(),
            headline: "Verify resume claims before you waste interview cycles".into(),
            subheadline: "Bullshit or Fit cross-checks credentials, employment claims, and \
                          public footprint evidence so you can screen with confidence."
                .into(),
        }
    }
}

/// Partial override served by the config endpoint. Absent and `null` fields
/// both decode to `None`; unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandingConfigPatch {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub cta: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub subheadline: Option<String>,
}

impl LandingConfig {
    /// Field-by-field override. A patch value wins only when it is present
    /// and non-null; every other field keeps its current value.
    pub fn apply(&mut self, patch: LandingConfigPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(cta) = patch.cta {
            self.cta = cta;
        }
        if let Some(headline) = patch.headline {
            self.headline = headline;
        }
        if let Some(subheadline) = patch.subheadline {
            self.subheadline = subheadline;
        }
    }
}

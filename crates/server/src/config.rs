use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub upstream_api_url: String,
    pub funnel_slug: String,
    pub cors_origins: String,
    pub static_dir: String,
    pub public_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            upstream_api_url: "http://127.0.0.1:9000/api/v1".into(),
            funnel_slug: "bullshit-or-fit".into(),
            cors_origins: "https://bullshitorfit.com,https://www.bullshitorfit.com".into(),
            static_dir: "./static".into(),
            public_url: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("gateway.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("upstream_api_url") {
                settings.upstream_api_url = v.clone();
            }
            if let Some(v) = file_cfg.get("funnel_slug") {
                settings.funnel_slug = v.clone();
            }
            if let Some(v) = file_cfg.get("cors_origins") {
                settings.cors_origins = v.clone();
            }
            if let Some(v) = file_cfg.get("static_dir") {
                settings.static_dir = v.clone();
            }
            if let Some(v) = file_cfg.get("public_url") {
                settings.public_url = Some(v.clone());
            }
        }
    }

    if let Ok(v) = std::env::var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Ok(v) = std::env::var("UPSTREAM_API_URL") {
        settings.upstream_api_url = v;
    }
    if let Ok(v) = std::env::var("APP__UPSTREAM_API_URL") {
        settings.upstream_api_url = v;
    }

    if let Ok(v) = std::env::var("FUNNEL_SLUG") {
        settings.funnel_slug = v;
    }
    if let Ok(v) = std::env::var("APP__FUNNEL_SLUG") {
        settings.funnel_slug = v;
    }

    if let Ok(v) = std::env::var("CORS_ORIGINS") {
        settings.cors_origins = v;
    }
    if let Ok(v) = std::env::var("APP__CORS_ORIGINS") {
        settings.cors_origins = v;
    }

    if let Ok(v) = std::env::var("STATIC_DIR") {
        settings.static_dir = v;
    }
    if let Ok(v) = std::env::var("APP__STATIC_DIR") {
        settings.static_dir = v;
    }

    if let Ok(v) = std::env::var("PUBLIC_URL") {
        settings.public_url = Some(v);
    }

    settings
}

/// Comma-separated origin list; entries are trimmed and empty entries dropped.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

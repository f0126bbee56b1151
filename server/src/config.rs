use anyhow::{Result, anyhow};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    pub hierarchy_max_chain: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let hierarchy_max_chain = match lookup("HIERARCHY_MAX_CHAIN") {
            Some(raw) if !raw.trim().is_empty() => {
                let limit = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or_else(|| {
                        anyhow!("HIERARCHY_MAX_CHAIN must be a positive integer, got {raw:?}")
                    })?;
                Some(limit)
            }
            _ => None,
        };

        Ok(Self {
            cors_allowed_origins,
            hierarchy_max_chain,
        })
    }
}

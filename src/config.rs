use crate::engine::PieceType;

/// Terminal front-end configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Draw pieces with Unicode chess glyphs instead of letters.
    pub unicode: bool,
    /// Answer promotion prompts with this piece instead of asking.
    pub auto_promote: Option<PieceType>,
    /// Print a JSON snapshot after every committed move.
    pub snapshot_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            log_filter: std::env::var("CHESS_LOG").unwrap_or(defaults.log_filter),
            unicode: std::env::var("CHESS_UNICODE")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.unicode),
            auto_promote: std::env::var("CHESS_AUTO_PROMOTE")
                .ok()
                .and_then(|v| parse_promotion(&v)),
            snapshot_json: std::env::var("CHESS_SNAPSHOT_JSON")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.snapshot_json),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_filter: "chess_rules=info".to_string(),
            unicode: false,
            auto_promote: None,
            snapshot_json: false,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Accepts a letter (`q`, `N`) or a name (`queen`); only promotion choices.
pub fn parse_promotion(value: &str) -> Option<PieceType> {
    let value = value.trim().to_ascii_lowercase();
    let kind = match value.as_str() {
        "queen" => PieceType::Queen,
        "rook" => PieceType::Rook,
        "bishop" => PieceType::Bishop,
        "knight" => PieceType::Knight,
        _ => {
            let mut chars = value.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return None;
            };
            PieceType::from_char(c)?.1
        }
    };
    kind.is_promotion_choice().then_some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.log_filter, "chess_rules=info");
        assert!(!config.unicode);
        assert_eq!(config.auto_promote, None);
        assert!(!config.snapshot_json);
    }

    #[test]
    fn from_env_defaults() {
        // Without setting env vars, should fall back to defaults
        let config = AppConfig::from_env();
        assert_eq!(config.auto_promote, None);
        assert!(!config.snapshot_json);
    }

    #[test]
    fn flags() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn promotion_choices() {
        assert_eq!(parse_promotion("q"), Some(PieceType::Queen));
        assert_eq!(parse_promotion("N"), Some(PieceType::Knight));
        assert_eq!(parse_promotion("rook"), Some(PieceType::Rook));
        assert_eq!(parse_promotion("k"), None);
        assert_eq!(parse_promotion("p"), None);
        assert_eq!(parse_promotion("qq"), None);
        assert_eq!(parse_promotion(""), None);
    }
}

pub const DRAFTS_PATH: &str = "/v1/drafts";
pub const QUESTIONS_PATH: &str = "/v1/questions";
pub const SIMULATIONS_PATH: &str = "/v1/simulations";
pub const SESSIONS_PATH: &str = "/v1/sessions";
pub const HEALTHZ_PATH: &str = "/healthz";

pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Request bodies larger than this are answered with 413.
pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

pub const CONFIG_PATH_ENV: &str = "REPLYWRIGHT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "./config/replywright_config.yaml";
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9092";
pub const GENERATOR_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Persona sections recognised in catalog files, in load order.
pub const PERSONA_SECTIONS: [&str; 3] = ["sales", "support", "success"];

/// Tag marking a God-Mode prompt usable for any pain point of its persona.
pub const WILDCARD_TAG: &str = "_wildcard";

pub const DEFAULT_MIN_MATCH_SCORE: usize = 2;
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.6;

use std::env;

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLAMA_MODEL_VERSION: &str =
    "replicate/llama-2-70b-chat:2c1608e18606fad2812020dc541930f2d0495ce32eee50074220b87300bc16e1";
const DEFAULT_HISTORY_FILE: &str = ".history.json";
const DEFAULT_CACHE_FILE: &str = ".cache.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Required by commands that hit the search API; checked at the point of
    /// use so `history` and `configure` work without any keys.
    pub serper_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub llama_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub llama_model_version: String,
    pub history_file: String,
    pub cache_file: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            serper_api_key: get_var("SERPER_API_KEY"),
            openai_api_key: get_var("OPENAI_API_KEY"),
            llama_api_key: get_var("REPLICATE_API_TOKEN").or_else(|| get_var("LLAMA_API_KEY")),
            openai_model: get_var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
            openai_base_url: get_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
            llama_model_version: get_var("LLAMA_MODEL_VERSION")
                .unwrap_or_else(|| DEFAULT_LLAMA_MODEL_VERSION.into()),
            history_file: get_var("SAGE_HISTORY_FILE")
                .unwrap_or_else(|| DEFAULT_HISTORY_FILE.into()),
            cache_file: get_var("SAGE_CACHE_FILE").unwrap_or_else(|| DEFAULT_CACHE_FILE.into()),
        }
    }
}

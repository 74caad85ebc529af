use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Overlay version meaning "no enhanced pack".
pub const BASIC_OVERLAY: &str = "mp-basic";

/// Persisted entitlement record, looked up by an organization's overlay version.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackConfig {
    pub id: Uuid,
    pub version: String,
    pub schema_version: String,
    #[schema(value_type = Object)]
    pub prompt_library: Value,
    #[schema(value_type = Object)]
    pub constraint_definitions: Value,
    #[schema(value_type = Object)]
    pub ai_model_config: Value,
    pub active: bool,
}

impl PackConfig {
    /// `ai_model_config.enabled`, accepting both `true` and `"true"`.
    pub fn ai_enabled(&self) -> bool {
        match self.ai_model_config.get("enabled") {
            Some(Value::Bool(enabled)) => *enabled,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn ui_overrides(&self) -> Option<Value> {
        self.constraint_definitions
            .get("uiOverrides")
            .filter(|v| !v.is_null())
            .cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PackType {
    Base,
    Enhanced,
}

/// Tier classification derived from the organization's overlay on every request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackBehavior {
    #[serde(rename = "type")]
    pub pack_type: PackType,
    pub ai_enabled: bool,
    pub philosophy_overlay: bool,
    pub use_core_logic_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_config: Option<PackConfig>,
    #[schema(value_type = Option<Object>)]
    pub ui_overrides: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PackBehavior {
    pub fn base() -> Self {
        Self {
            pack_type: PackType::Base,
            ai_enabled: false,
            philosophy_overlay: false,
            use_core_logic_only: true,
            pack_config: None,
            ui_overrides: None,
            version: None,
        }
    }

    pub fn enhanced(config: PackConfig) -> Self {
        Self {
            pack_type: PackType::Enhanced,
            ai_enabled: config.ai_enabled(),
            philosophy_overlay: true,
            use_core_logic_only: false,
            ui_overrides: config.ui_overrides(),
            version: Some(config.version.clone()),
            pack_config: Some(config),
        }
    }

    pub fn is_enhanced(&self) -> bool {
        self.pack_type == PackType::Enhanced
    }
}

/// Final flag set exposed to callers.
///
/// `philosophy_overlay`, `advanced_constraints` and `drill_recommendations`
/// are all "is the pack enhanced" today; they stay separate fields so they can
/// diverge without changing the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackFeatures {
    pub player_management: bool,
    pub basic_observations: bool,
    pub simple_pdp: bool,
    pub ai_enabled: bool,
    pub philosophy_overlay: bool,
    pub advanced_constraints: bool,
    pub drill_recommendations: bool,
    #[schema(value_type = Option<Object>)]
    pub ui_overrides: Option<Value>,
}

impl From<&PackBehavior> for PackFeatures {
    fn from(behavior: &PackBehavior) -> Self {
        let enhanced = behavior.is_enhanced();
        PackFeatures {
            player_management: true,
            basic_observations: true,
            simple_pdp: true,
            ai_enabled: behavior.ai_enabled,
            philosophy_overlay: enhanced,
            advanced_constraints: enhanced,
            drill_recommendations: enhanced,
            ui_overrides: behavior.ui_overrides.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromptTemplate {
    pub use_case: String,
    pub version: String,
    pub system_instructions: String,
}

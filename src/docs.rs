use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::access::{AccessLevel, Capability, Feature, RoleUiConfig};
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::access::my_roles,
		routes::access::my_ui_config,
		routes::access::check_capability,
		routes::access::my_access_level,
		routes::access::my_conditions,
		routes::access::my_feature,
		routes::organizations::pack_behavior,
		routes::organizations::pack_features
	),
	components(
		schemas(
			routes::health::HealthResponse,
			routes::access::RolesResponse,
			routes::access::CapabilityCheckRequest,
			routes::access::CapabilityCheckResponse,
			routes::access::AccessLevelResponse,
			routes::access::ConditionsResponse,
			routes::access::FeatureResponse,
			models::person::PersonType,
			models::role::ScopeType,
			models::role::RoleContext,
			models::role::RoleWithContext,
			models::pack::PackConfig,
			models::pack::PackType,
			models::pack::PackBehavior,
			models::pack::PackFeatures,
			AccessLevel,
			Capability,
			Feature,
			RoleUiConfig
		)
	),
	tags(
		(name = "Health", description = "Service health"),
		(name = "Access", description = "Capabilities, data scopes and feature gates of the caller"),
		(name = "Organizations", description = "Organization pack entitlements")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

	normalize_path_operations(&mut doc);
	ensure_security_components(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.persist_authorization(true);

	let doc = Arc::new(doc);
	let json_route = get(move || {
		let doc = Arc::clone(&doc);
		async move { Json((*doc).clone()) }
	});

	Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config))
}

fn normalize_path_operations(doc: &mut Value) {
	let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
		return;
	};

	for item in paths.values_mut() {
		let Some(ops) = item.as_object() else {
			continue;
		};
		let mut normalized = Map::new();
		for (method, val) in ops {
			let key = method.to_lowercase();
			if let Some(existing) = normalized.get_mut(&key) {
				merge_values(existing, val);
			} else {
				normalized.insert(key, val.clone());
			}
		}
		*item = Value::Object(normalized);
	}
}

fn ensure_security_components(doc: &mut Value) {
	let Some(root) = doc.as_object_mut() else {
		return;
	};

	let components = root
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()));
	if let Some(components) = components.as_object_mut() {
		let schemes = components
			.entry("securitySchemes")
			.or_insert_with(|| Value::Object(Map::new()));
		if let Some(schemes) = schemes.as_object_mut() {
			schemes.insert(
				"bearerAuth".to_string(),
				json!({
					"type": "http",
					"scheme": "bearer",
					"bearerFormat": "JWT"
				}),
			);
		}
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(a), Value::Object(b)) => {
			for (k, vb) in b {
				if let Some(va) = a.get_mut(k) {
					merge_values(va, vb);
				} else {
					a.insert(k.clone(), vb.clone());
				}
			}
		}
		(Value::Array(a), Value::Array(b)) => {
			for item in b {
				if !a.contains(item) {
					a.push(item.clone());
				}
			}
		}
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_keeps_existing_scalars() {
		let mut a = json!({"get": {"summary": "a", "tags": ["Access"]}});
		merge_values(&mut a, &json!({"get": {"summary": "b", "tags": ["Access", "Extra"]}}));
		assert_eq!(a["get"]["summary"], "a");
		assert_eq!(a["get"]["tags"], json!(["Access", "Extra"]));
	}

	#[test]
	fn servers_are_not_duplicated() {
		let mut doc = json!({});
		ensure_servers(&mut doc, 9000);
		ensure_servers(&mut doc, 9000);
		assert_eq!(doc["servers"].as_array().map(Vec::len), Some(1));
	}
}

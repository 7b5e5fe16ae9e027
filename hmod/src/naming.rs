use hwir::Attribute;
use lazy_static::lazy_static;
use regex::Regex;

use crate::params::ParameterKey;

lazy_static! {
	static ref DROPPED_CHARS: Regex = Regex::new(r#"[!>\[\],"]"#).unwrap();
	static ref SEPARATORS: Regex = Regex::new(r"[^0-9a-zA-Z]+").unwrap();
}

/// Renders a parameter value for use in a module name
pub fn value_string(value: &Attribute) -> String {
	match value {
		Attribute::Str(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Collapses everything that is not alphanumeric into single underscores
pub fn sanitize(name: &str) -> String {
	let name = DROPPED_CHARS.replace_all(name, "");
	SEPARATORS.replace_all(&name, "_").trim_matches('_').to_string()
}

/// Creates a reasonable module name from a base name and a set of
/// parameters, e.g. `PolyCompute_coeff62_width16`. Parameters are sorted
/// by their rendered form, so the result does not depend on the order in
/// which they were supplied.
pub fn create_module_name(base: &str, params: &ParameterKey) -> String {
	let mut param_strings: Vec<String> = params
		.iter()
		.map(|(name, value)| format!("{}{}", name, value_string(value)))
		.collect();
	param_strings.sort();

	let mut name = base.to_string();
	for ps in param_strings {
		name.push('_');
		name.push_str(&ps);
	}
	sanitize(&name)
}

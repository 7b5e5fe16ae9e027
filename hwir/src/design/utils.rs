use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
	static ref VALID_ID_REGEX: Regex = Regex::new(r"^[a-zA-Z_][0-9a-zA-Z_]*$").unwrap();
}

/// Checks if given name is a legal symbol in the IR text format
pub fn is_name_valid(name: &str) -> bool {
	VALID_ID_REGEX.is_match(name)
}

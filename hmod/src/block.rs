use std::collections::HashSet;

/// Bookkeeping for a generator scope
#[derive(Debug, Default)]
pub struct BlockContext {
	symbols: HashSet<String>,
}

impl BlockContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a unique symbol and records it as used
	pub fn uniquify_symbol(&mut self, sym: &str) -> String {
		let mut ctr = 0;
		let mut ret = sym.to_string();
		while self.symbols.contains(&ret) {
			ctr += 1;
			ret = format!("{}_{}", sym, ctr);
		}
		self.symbols.insert(ret.clone());
		ret
	}

	/// Releases a symbol, e.g. when the object using it was discarded
	pub fn release(&mut self, sym: &str) -> bool {
		self.symbols.remove(sym)
	}

	pub fn contains(&self, sym: &str) -> bool {
		self.symbols.contains(sym)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_uniquify() {
		let mut bc = BlockContext::new();
		assert_eq!(bc.uniquify_symbol("adder"), "adder");
		assert_eq!(bc.uniquify_symbol("adder"), "adder_1");
		assert_eq!(bc.uniquify_symbol("adder"), "adder_2");
		assert_eq!(bc.uniquify_symbol("other"), "other");
		assert!(bc.contains("adder_1"));
	}

	#[test]
	fn test_suffix_collision() {
		let mut bc = BlockContext::new();
		assert_eq!(bc.uniquify_symbol("x_1"), "x_1");
		assert_eq!(bc.uniquify_symbol("x"), "x");
		assert_eq!(bc.uniquify_symbol("x"), "x_2");
	}

	#[test]
	fn test_release() {
		let mut bc = BlockContext::new();
		bc.uniquify_symbol("m");
		assert!(bc.release("m"));
		assert_eq!(bc.uniquify_symbol("m"), "m");
	}
}

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

pub const ABOUT: &str = "Search journal entries with quoted phrase filters and semantic ranking.";

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
}

/// Value parser for `top_k`-style flags, which must be at least one.
pub fn parse_positive(raw: &str) -> Result<u32, String> {
	let value = raw.trim().parse::<u32>().map_err(|err| format!("{raw:?} is not a number: {err}"))?;

	if value == 0 {
		return Err("Value must be greater than zero.".to_string());
	}

	Ok(value)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn positive_parser_rejects_zero_and_garbage() {
		assert_eq!(parse_positive("5"), Ok(5));
		assert_eq!(parse_positive(" 12 "), Ok(12));
		assert!(parse_positive("0").is_err());
		assert!(parse_positive("-1").is_err());
		assert!(parse_positive("many").is_err());
	}
}
